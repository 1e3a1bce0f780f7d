#![allow(unused_imports)]

use inline_canvas::{
    count_line_breaks, parse_prompt_timeout, visible_length, visual, with_prompt_timeout,
    write_chunked, CancelToken, Canvas, CanvasManager, CanvasOptions, CanvasSize, Confirm,
    ConfirmOptions, CursorCmd, CursorPosition, EnvConfig, FocusGuard, Input, InputConfig,
    InputSource, Key, KeyPressEventArgs, MultiSelect, MultiSelectChoice, MultiSelectOptions,
    Phase, Printer, Progress, Prompt, PromptOptions, ReadStatus, Result, ScriptedSource, Select,
    SelectChoice, SelectOptions, SharedBuffer, Spinner, SpinnerOptions, Style, TaskError,
    TaskFailure, TaskList, TaskListError, TaskListOptions, TaskOptions, TaskState, Ticker, UxError,
    Validator, Visual, WidthSource, MAX_CHUNK_SIZE,
};

#[test]
fn public_api_exports_compile() {}
