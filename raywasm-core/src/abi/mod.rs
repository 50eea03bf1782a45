//! raywasm ABI module
//!
//! This module defines the contract between:
//! - **Host**: `raywasm-core`
//! - **Guest**: a raylib game compiled for `wasm32` with undefined symbols allowed
//!   (`-Wl,--allow-undefined -Wl,--export-table -Wl,--export=main`).
//!
//! ## Imports (guest -> host)
//! Every raylib function the game calls becomes an import from module `"env"`, named
//! exactly like the C function. The wasm32 C ABI shapes the signatures:
//! - structs passed by value (`Color`, `Vector2`, `Rectangle`, `Texture2D`, `Font`)
//!   arrive as a pointer into guest memory,
//! - structs returned by value are written through a result pointer passed first,
//! - `bool` is an `i32`, variadic arguments arrive as a pointer to a packed va_list.
//!
//! ## Exports (host -> guest) required
//! - `memory`
//! - `main`: called once after instantiation
//! - `__indirect_function_table`: read by `raylib_js_set_entry` to find the per-frame
//!   callback

/// Import module name used by the guest.
pub const IMPORT_MODULE: &str = "env";

/// Guest export names.
pub mod guest_exports {
    pub const MEMORY: &str = "memory";
    /// Called once, to completion, before the first frame.
    pub const MAIN: &str = "main";
    pub const FUNCTION_TABLE: &str = "__indirect_function_table";
}

/// Host import names provided to the guest.
pub mod host_imports {
    // Window / timing
    pub const INIT_WINDOW: &str = "InitWindow";
    pub const CLOSE_WINDOW: &str = "CloseWindow";
    pub const WINDOW_SHOULD_CLOSE: &str = "WindowShouldClose";
    pub const SET_TARGET_FPS: &str = "SetTargetFPS";
    pub const GET_SCREEN_WIDTH: &str = "GetScreenWidth";
    pub const GET_SCREEN_HEIGHT: &str = "GetScreenHeight";
    pub const GET_FRAME_TIME: &str = "GetFrameTime";
    pub const BEGIN_DRAWING: &str = "BeginDrawing";
    pub const END_DRAWING: &str = "EndDrawing";

    // Shapes
    pub const CLEAR_BACKGROUND: &str = "ClearBackground";
    pub const DRAW_CIRCLE: &str = "DrawCircle";
    pub const DRAW_CIRCLE_V: &str = "DrawCircleV";
    pub const DRAW_CIRCLE_LINES: &str = "DrawCircleLines";
    pub const DRAW_CIRCLE_LINES_V: &str = "DrawCircleLinesV";
    pub const DRAW_CIRCLE_GRADIENT: &str = "DrawCircleGradient";
    pub const DRAW_RING: &str = "DrawRing";
    pub const DRAW_RECTANGLE: &str = "DrawRectangle";
    pub const DRAW_RECTANGLE_REC: &str = "DrawRectangleRec";
    pub const DRAW_RECTANGLE_LINES: &str = "DrawRectangleLines";
    pub const DRAW_RECTANGLE_LINES_EX: &str = "DrawRectangleLinesEx";
    pub const DRAW_TRIANGLE: &str = "DrawTriangle";

    // Text
    pub const DRAW_TEXT: &str = "DrawText";
    pub const DRAW_TEXT_EX: &str = "DrawTextEx";
    pub const MEASURE_TEXT: &str = "MeasureText";
    pub const MEASURE_TEXT_EX: &str = "MeasureTextEx";
    pub const TEXT_FORMAT: &str = "TextFormat";
    pub const TEXT_SUBTEXT: &str = "TextSubtext";

    // Textures / fonts
    pub const LOAD_TEXTURE: &str = "LoadTexture";
    pub const DRAW_TEXTURE: &str = "DrawTexture";
    pub const LOAD_FONT_EX: &str = "LoadFontEx";
    pub const GEN_TEXTURE_MIPMAPS: &str = "GenTextureMipmaps";
    pub const SET_TEXTURE_FILTER: &str = "SetTextureFilter";

    // Input
    pub const IS_KEY_DOWN: &str = "IsKeyDown";
    pub const IS_KEY_PRESSED: &str = "IsKeyPressed";
    pub const IS_KEY_RELEASED: &str = "IsKeyReleased";
    pub const IS_KEY_UP: &str = "IsKeyUp";
    pub const IS_MOUSE_BUTTON_DOWN: &str = "IsMouseButtonDown";
    pub const IS_MOUSE_BUTTON_PRESSED: &str = "IsMouseButtonPressed";
    pub const IS_MOUSE_BUTTON_RELEASED: &str = "IsMouseButtonReleased";
    pub const IS_MOUSE_BUTTON_UP: &str = "IsMouseButtonUp";
    pub const GET_MOUSE_POSITION: &str = "GetMousePosition";
    pub const GET_MOUSE_DELTA: &str = "GetMouseDelta";
    pub const GET_MOUSE_X: &str = "GetMouseX";
    pub const GET_MOUSE_Y: &str = "GetMouseY";
    pub const GET_MOUSE_WHEEL_MOVE: &str = "GetMouseWheelMove";
    pub const IS_GESTURE_DETECTED: &str = "IsGestureDetected";

    // Colors
    pub const COLOR_LERP: &str = "ColorLerp";
    pub const COLOR_BRIGHTNESS: &str = "ColorBrightness";
    pub const COLOR_FROM_HSV: &str = "ColorFromHSV";
    pub const FADE: &str = "Fade";
    pub const COLOR_ALPHA: &str = "ColorAlpha";

    // Math / collision
    pub const LERP: &str = "Lerp";
    pub const POW: &str = "pow";
    pub const SINF: &str = "sinf";
    pub const COSF: &str = "cosf";
    pub const FMOD: &str = "fmod";
    pub const VECTOR2_DISTANCE: &str = "Vector2Distance";
    pub const CHECK_COLLISION_POINT_REC: &str = "CheckCollisionPointRec";
    pub const CHECK_COLLISION_CIRCLES: &str = "CheckCollisionCircles";
    pub const CHECK_COLLISION_POINT_CIRCLE: &str = "CheckCollisionPointCircle";

    // libc shims
    pub const RAND: &str = "rand";
    pub const SRAND: &str = "srand";
    pub const TIME: &str = "time";

    // Logging
    pub const SET_TRACE_LOG_LEVEL: &str = "SetTraceLogLevel";
    pub const TRACE_LOG: &str = "TraceLog";
    pub const PRINT_WORD: &str = "print_word";

    // Frame loop
    pub const SET_ENTRY: &str = "raylib_js_set_entry";
}

/// raylib `TraceLogLevel`.
#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum LogLevel {
    All = 0,
    Trace = 1,
    Debug = 2,
    Info = 3,
    Warning = 4,
    Error = 5,
    /// Aborts forward progress of the session.
    Fatal = 6,
    None = 7,
}

impl LogLevel {
    pub fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            0 => LogLevel::All,
            1 => LogLevel::Trace,
            2 => LogLevel::Debug,
            3 => LogLevel::Info,
            4 => LogLevel::Warning,
            5 => LogLevel::Error,
            6 => LogLevel::Fatal,
            7 => LogLevel::None,
            _ => return None,
        })
    }

    pub const fn label(self) -> &'static str {
        match self {
            LogLevel::All => "ALL",
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
            LogLevel::None => "NONE",
        }
    }
}

/// `PIXELFORMAT_UNCOMPRESSED_R8G8B8A8`.
pub const PIXEL_FORMAT_R8G8B8A8: u32 = 7;

/// Dimensions reported for a texture whose file cannot be probed up front.
pub const PLACEHOLDER_TEXTURE_SIZE: u32 = 256;

/// Mouse button codes as the guest sees them.
pub mod mouse_buttons {
    pub const LEFT: i32 = 0;
    pub const RIGHT: i32 = 1;
    pub const MIDDLE: i32 = 2;
}
