//! End-to-end tests driving small WAT guests through a [`Runner`].

use super::*;
use crate::input::InputEvent;
use crate::memory::Vector2;
use crate::surface::{Color, Paint, PaintLog, PaintOp};

const RED: Color = Color::new(255, 0, 0, 255);

/// A guest that opens a 200x100 window titled "demo" and, every frame, clears to black
/// and runs `$body`. `extra_imports` are spliced into the import section.
fn guest(extra_imports: &str, body: &str) -> String {
    format!(
        r#"(module
  (import "env" "InitWindow" (func $init (param i32 i32 i32)))
  (import "env" "ClearBackground" (func $clear (param i32)))
  (import "env" "DrawRectangle" (func $rect (param i32 i32 i32 i32 i32)))
  (import "env" "raylib_js_set_entry" (func $set_entry (param i32)))
  {extra_imports}
  (memory (export "memory") 1)
  (table (export "__indirect_function_table") 1 funcref)
  (elem (i32.const 0) $frame)
  (data (i32.const 16) "\ff\00\00\ff")
  (data (i32.const 20) "\00\00\00\ff")
  (data (i32.const 32) "demo\00")
  (func $frame
    (call $clear (i32.const 20))
    {body})
  (func (export "main")
    (call $init (i32.const 200) (i32.const 100) (i32.const 32))
    (call $set_entry (i32.const 0))))"#
    )
}

fn red_rect_guest() -> String {
    guest(
        "",
        "(call $rect (i32.const 10) (i32.const 10) (i32.const 100) (i32.const 50) (i32.const 16))",
    )
}

fn recording_runner(log: &PaintLog) -> Runner {
    let display = HeadlessDisplay::new("canvas", 640, 480)
        .recording(log.clone())
        .with_interval_ms(10.0);
    Runner::new(HostConfig::default(), display).unwrap()
}

fn fill_rects(log: &PaintLog) -> Vec<(f32, f32, f32, f32)> {
    log.ops()
        .into_iter()
        .filter_map(|op| match op {
            PaintOp::FillRect { x, y, w, h } => Some((x, y, w, h)),
            _ => None,
        })
        .collect()
}

#[test]
fn one_tick_paints_the_red_rectangle() {
    let log = PaintLog::new();
    let mut runner = recording_runner(&log);
    runner.start_bytes(red_rect_guest().as_bytes(), "canvas").unwrap();

    assert_eq!(runner.phase(), Phase::Running);
    assert_eq!(runner.title(), Some("demo"));
    assert!(log.ops().contains(&PaintOp::Resize {
        width: 200,
        height: 100
    }));

    assert_eq!(runner.tick().unwrap(), Phase::Running);
    let ops = log.ops();
    let red_fill = ops
        .iter()
        .position(|op| *op == PaintOp::SetFill(Paint::Solid(RED)))
        .unwrap();
    assert_eq!(
        ops[red_fill + 1],
        PaintOp::FillRect {
            x: 10.0,
            y: 10.0,
            w: 100.0,
            h: 50.0
        }
    );
}

#[test]
fn framebuffer_display_produces_pixels() {
    let display = HeadlessDisplay::new("canvas", 640, 480);
    let mut runner = Runner::new(HostConfig::default(), display).unwrap();
    runner.start_bytes(red_rect_guest().as_bytes(), "canvas").unwrap();
    runner.run_frames(1).unwrap();

    let image = runner.snapshot().unwrap();
    assert_eq!((image.width, image.height), (200, 100));
    assert_eq!(image.pixel(20, 20), Some(RED));
    assert_eq!(image.pixel(5, 5), Some(Color::BLACK));
    assert_eq!(image.pixel(110, 60), Some(Color::BLACK));
}

#[test]
fn second_start_is_rejected_and_leaves_the_session_alone() {
    let log = PaintLog::new();
    let mut runner = recording_runner(&log);
    runner.start_bytes(red_rect_guest().as_bytes(), "canvas").unwrap();

    let err = runner
        .start_bytes(red_rect_guest().as_bytes(), "canvas")
        .unwrap_err();
    assert!(matches!(err, HostError::AlreadyRunning));
    assert_eq!(runner.phase(), Phase::Running);
    assert_eq!(runner.title(), Some("demo"));
    assert_eq!(runner.tick().unwrap(), Phase::Running);
}

#[test]
fn missing_surface_aborts_the_start() {
    let log = PaintLog::new();
    let mut runner = recording_runner(&log);
    let err = runner
        .start_bytes(red_rect_guest().as_bytes(), "missing")
        .unwrap_err();
    assert!(matches!(err, HostError::SurfaceUnavailable(ref t) if t == "missing"));
    assert_eq!(runner.phase(), Phase::Idle);
    assert!(log.is_empty());

    // The runner is reusable afterwards.
    runner.start_bytes(red_rect_guest().as_bytes(), "canvas").unwrap();
}

#[test]
fn key_press_is_seen_for_exactly_one_frame() {
    let log = PaintLog::new();
    let wat = guest(
        r#"(import "env" "IsKeyPressed" (func $pressed (param i32) (result i32)))"#,
        "(if (call $pressed (i32.const 32))
           (then
             (call $rect (i32.const 1) (i32.const 2) (i32.const 3) (i32.const 4) (i32.const 16))))",
    );
    let mut runner = recording_runner(&log);
    runner.start_bytes(wat.as_bytes(), "canvas").unwrap();
    let handle = runner.input_handle().unwrap();

    assert!(handle.dispatch(InputEvent::KeyDown("Space".into())));
    runner.run_frames(3).unwrap();

    let pressed: Vec<_> = fill_rects(&log)
        .into_iter()
        .filter(|r| *r == (1.0, 2.0, 3.0, 4.0))
        .collect();
    assert_eq!(pressed.len(), 1);
}

#[test]
fn mouse_position_is_relative_to_the_surface() {
    let log = PaintLog::new();
    let display = HeadlessDisplay::new("canvas", 640, 480)
        .recording(log.clone())
        .with_origin(Vector2 { x: 100.0, y: 50.0 });
    let mut runner = Runner::new(HostConfig::default(), display).unwrap();
    let wat = guest(
        r#"(import "env" "GetMouseX" (func $mx (result i32)))
           (import "env" "GetMouseY" (func $my (result i32)))"#,
        "(call $rect (call $mx) (call $my) (i32.const 1) (i32.const 1) (i32.const 16))",
    );
    runner.start_bytes(wat.as_bytes(), "canvas").unwrap();
    runner
        .input_handle()
        .unwrap()
        .dispatch(InputEvent::MouseMove { x: 110.0, y: 60.0 });
    runner.tick().unwrap();

    assert!(fill_rects(&log).contains(&(10.0, 10.0, 1.0, 1.0)));
}

#[test]
fn frame_time_follows_the_refresh_interval() {
    let log = PaintLog::new();
    let wat = guest(
        r#"(import "env" "GetFrameTime" (func $dt (result f32)))"#,
        "(call $rect (i32.const 0) (i32.const 0)
           (i32.trunc_f32_s (f32.nearest (f32.mul (call $dt) (f32.const 1000))))
           (i32.const 1) (i32.const 16))",
    );
    let mut runner = recording_runner(&log);
    runner.start_bytes(wat.as_bytes(), "canvas").unwrap();
    runner.tick().unwrap();

    assert!(fill_rects(&log).contains(&(0.0, 0.0, 10.0, 1.0)));
}

#[test]
fn unimplemented_import_fails_only_when_called() {
    let log = PaintLog::new();
    let wat = guest(
        r#"(import "env" "DrawPoly" (func $poly (param i32 f32)))"#,
        "(call $poly (i32.const 3) (f32.const 1.5))",
    );
    let mut runner = recording_runner(&log);
    runner.start_bytes(wat.as_bytes(), "canvas").unwrap();

    let err = runner.tick().unwrap_err();
    assert!(
        matches!(
            &err,
            HostError::Unimplemented { name, args } if name == "DrawPoly" && args == "3,1.5"
        ),
        "{err}"
    );
    assert!(err.to_string().contains("NOT IMPLEMENTED: DrawPoly"));
    assert_eq!(runner.phase(), Phase::Idle);
}

#[test]
fn fatal_trace_log_aborts_the_start() {
    let log = PaintLog::new();
    let wat = r#"(module
  (import "env" "TraceLog" (func $log (param i32 i32 i32)))
  (memory (export "memory") 1)
  (data (i32.const 16) "boom %d\00")
  (data (i32.const 64) "\07\00\00\00")
  (func (export "main")
    (call $log (i32.const 6) (i32.const 16) (i32.const 64))))"#;
    let mut runner = recording_runner(&log);

    let err = runner.start_bytes(wat.as_bytes(), "canvas").unwrap_err();
    assert!(matches!(&err, HostError::FatalLog(msg) if msg == "boom 7"), "{err}");
    assert_eq!(runner.phase(), Phase::Idle);
}

/// A guest whose `main` logs `"boom %s"` at `level` with a string argument pointing far
/// outside its single page of memory.
fn bad_argument_log_guest(level: i32) -> String {
    format!(
        r#"(module
  (import "env" "TraceLog" (func $log (param i32 i32 i32)))
  (memory (export "memory") 1)
  (data (i32.const 16) "boom %s\00")
  (data (i32.const 64) "\00\00\ff\00")
  (func (export "main")
    (call $log (i32.const {level}) (i32.const 16) (i32.const 64))))"#
    )
}

#[test]
fn fatal_trace_log_survives_a_bad_argument() {
    let log = PaintLog::new();
    let mut runner = recording_runner(&log);
    let err = runner
        .start_bytes(bad_argument_log_guest(6).as_bytes(), "canvas")
        .unwrap_err();
    assert!(matches!(&err, HostError::FatalLog(msg) if msg == "boom %s"), "{err}");
    assert_eq!(runner.phase(), Phase::Idle);
}

#[test]
fn suppressed_trace_log_never_reads_its_arguments() {
    let log = PaintLog::new();
    let mut runner = recording_runner(&log);
    runner
        .start_bytes(bad_argument_log_guest(2).as_bytes(), "canvas")
        .unwrap();
    assert_eq!(runner.phase(), Phase::Running);
}

#[test]
fn stop_clears_the_surface_and_detaches_input() {
    let log = PaintLog::new();
    let mut runner = recording_runner(&log);
    runner.start_bytes(red_rect_guest().as_bytes(), "canvas").unwrap();
    runner.tick().unwrap();
    let handle = runner.input_handle().unwrap();

    runner.stop_handle().stop();
    assert_eq!(runner.tick().unwrap(), Phase::Idle);
    assert_eq!(
        log.ops().last(),
        Some(&PaintOp::ClearRect {
            x: 0.0,
            y: 0.0,
            w: 200.0,
            h: 100.0
        })
    );
    assert!(!handle.dispatch(InputEvent::KeyDown("Space".into())));
    assert!(runner.input_handle().is_none());
    assert!(matches!(runner.tick(), Err(HostError::NotRunning)));

    // The flag was reset, so a new session runs normally.
    runner.start_bytes(red_rect_guest().as_bytes(), "canvas").unwrap();
    assert_eq!(runner.tick().unwrap(), Phase::Running);
}

#[test]
fn close_window_stops_on_the_following_tick() {
    let log = PaintLog::new();
    let wat = guest(
        r#"(import "env" "CloseWindow" (func $close))"#,
        "(call $close)",
    );
    let mut runner = recording_runner(&log);
    runner.start_bytes(wat.as_bytes(), "canvas").unwrap();

    assert_eq!(runner.run_frames(10).unwrap(), 1);
    assert_eq!(runner.phase(), Phase::Idle);
}

#[test]
fn run_returns_once_the_guest_closes_the_window() {
    let log = PaintLog::new();
    let wat = guest(
        r#"(import "env" "CloseWindow" (func $close))"#,
        "(call $close)",
    );
    let mut runner = recording_runner(&log);
    runner.start_bytes(wat.as_bytes(), "canvas").unwrap();
    runner.run().unwrap();
    assert_eq!(runner.phase(), Phase::Idle);
}

#[test]
fn missing_frame_callback_is_reported() {
    let log = PaintLog::new();
    let wat = r#"(module
  (memory (export "memory") 1)
  (func (export "main") (param i32 i32) (result i32) (i32.const 0)))"#;
    let mut runner = recording_runner(&log);
    runner.start_bytes(wat.as_bytes(), "canvas").unwrap();

    assert!(matches!(runner.tick(), Err(HostError::NoFrameCallback)));
    assert_eq!(runner.phase(), Phase::Idle);
}

#[test]
fn guest_without_memory_is_rejected() {
    let log = PaintLog::new();
    let mut runner = recording_runner(&log);
    let err = runner
        .start_bytes(br#"(module (func (export "main")))"#, "canvas")
        .unwrap_err();
    assert!(matches!(err, HostError::MissingExport("memory")));
}

#[test]
fn texture_records_report_png_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    crate::assets::write_png(&crate::surface::Image::new(12, 7), &dir.path().join("tile.png"))
        .unwrap();

    let log = PaintLog::new();
    let config = HostConfig {
        asset_root: dir.path().to_path_buf(),
        ..HostConfig::default()
    };
    let display = HeadlessDisplay::new("canvas", 64, 64).recording(log.clone());
    let mut runner = Runner::new(config, display).unwrap();
    let wat = guest(
        r#"(import "env" "LoadTexture" (func $load (param i32 i32)))
           (import "env" "DrawTexture" (func $draw (param i32 i32 i32 i32)))
           (global $loaded (mut i32) (i32.const 0))
           (data (i32.const 48) "tile.png\00")"#,
        "(if (i32.eqz (global.get $loaded))
           (then
             (call $load (i32.const 128) (i32.const 48))
             (global.set $loaded (i32.const 1))))
         (call $rect (i32.const 0) (i32.const 0)
           (i32.load (i32.const 132)) (i32.load (i32.const 136)) (i32.const 16))
         (call $draw (i32.const 128) (i32.const 5) (i32.const 6) (i32.const 16))",
    );
    runner.start_bytes(wat.as_bytes(), "canvas").unwrap();
    runner.tick().unwrap();
    assert!(fill_rects(&log).contains(&(0.0, 0.0, 12.0, 7.0)));

    runner.settle_assets();
    runner.tick().unwrap();
    assert!(log.ops().contains(&PaintOp::DrawImage {
        width: 12,
        height: 7,
        x: 5.0,
        y: 6.0
    }));
}

#[test]
fn drawing_an_unissued_texture_traps() {
    let log = PaintLog::new();
    let wat = guest(
        r#"(import "env" "DrawTexture" (func $draw (param i32 i32 i32 i32)))
           (data (i32.const 128) "\09\00\00\00")"#,
        "(call $draw (i32.const 128) (i32.const 0) (i32.const 0) (i32.const 16))",
    );
    let mut runner = recording_runner(&log);
    runner.start_bytes(wat.as_bytes(), "canvas").unwrap();
    assert!(matches!(
        runner.tick(),
        Err(HostError::UnknownHandle {
            kind: "texture",
            index: 9
        })
    ));
}
