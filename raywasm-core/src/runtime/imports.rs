//! Host import definitions.
//!
//! Every implemented import is defined explicitly under module `"env"`. After that,
//! each remaining `env` function the module declares gets a stub with its exact type
//! that traps with [`HostError::Unimplemented`] when called, so a guest that merely
//! declares an unsupported function still instantiates.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use tracing::{debug, error, info, trace, warn};
use wasmtime::{Caller, Extern, ExternType, IntoFunc, Linker, Module, Val};

use super::HostState;
use crate::abi::{IMPORT_MODULE, LogLevel, PIXEL_FORMAT_R8G8B8A8, PLACEHOLDER_TEXTURE_SIZE};
use crate::abi::{guest_exports, host_imports as hi};
use crate::assets::{Slot, probe_png_size};
use crate::draw::{self, color};
use crate::error::HostError;
use crate::input;
use crate::memory::{self, GuestMemoryMut, Rectangle, TextureRecord, Vector2};
use crate::printf::{self, GuestVaList};
use crate::surface::{FontFace, FontSpec};

type Ctx<'a> = Caller<'a, HostState>;

/// Run `f` with a fresh view of the caller's memory and its host state.
fn with_memory<R>(
    caller: &mut Ctx<'_>,
    f: impl FnOnce(&mut GuestMemoryMut<'_>, &mut HostState) -> Result<R, HostError>,
) -> wasmtime::Result<R> {
    let memory = memory::resolve(caller).map_err(HostError::from)?;
    let (bytes, state) = memory.data_and_store_mut(caller);
    Ok(f(&mut GuestMemoryMut::new(bytes), state)?)
}

fn flag(b: bool) -> i32 {
    b as i32
}

fn rect_from_ints(x: i32, y: i32, w: i32, h: i32) -> Rectangle {
    Rectangle {
        x: x as f32,
        y: y as f32,
        width: w as f32,
        height: h as f32,
    }
}

fn point(x: i32, y: i32) -> Vector2 {
    Vector2 {
        x: x as f32,
        y: y as f32,
    }
}

/// Linker wrapper that remembers which names it defined.
struct ImportTable<'l> {
    linker: &'l mut Linker<HostState>,
    defined: HashSet<&'static str>,
}

impl ImportTable<'_> {
    fn wrap<Params, Results>(
        &mut self,
        name: &'static str,
        func: impl IntoFunc<HostState, Params, Results>,
    ) -> Result<(), HostError> {
        self.linker
            .func_wrap(IMPORT_MODULE, name, func)
            .map_err(HostError::Runtime)?;
        self.defined.insert(name);
        Ok(())
    }
}

/// Define all host imports, then trap stubs for every other `env` function `module` imports.
pub fn link(linker: &mut Linker<HostState>, module: &Module) -> Result<(), HostError> {
    let mut table = ImportTable {
        linker,
        defined: HashSet::new(),
    };
    define_window(&mut table)?;
    define_shapes(&mut table)?;
    define_text(&mut table)?;
    define_resources(&mut table)?;
    define_input(&mut table)?;
    define_colors(&mut table)?;
    define_math(&mut table)?;
    define_libc(&mut table)?;
    define_logging(&mut table)?;
    define_entry(&mut table)?;

    let ImportTable { linker, defined } = table;
    for import in module.imports() {
        if import.module() != IMPORT_MODULE || defined.contains(import.name()) {
            continue;
        }
        let ExternType::Func(ty) = import.ty() else {
            continue;
        };
        let name = import.name().to_owned();
        debug!(%name, "guest imports an unimplemented function");
        linker
            .func_new(IMPORT_MODULE, import.name(), ty, move |_caller, params, _results| {
                Err(HostError::Unimplemented {
                    name: name.clone(),
                    args: render_args(params),
                }
                .into())
            })
            .map_err(HostError::Runtime)?;
    }
    Ok(())
}

fn render_args(params: &[Val]) -> String {
    params
        .iter()
        .map(|v| match v {
            Val::I32(x) => x.to_string(),
            Val::I64(x) => x.to_string(),
            Val::F32(bits) => f32::from_bits(*bits).to_string(),
            Val::F64(bits) => f64::from_bits(*bits).to_string(),
            _ => "?".to_owned(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn define_window(t: &mut ImportTable<'_>) -> Result<(), HostError> {
    t.wrap(
        hi::INIT_WINDOW,
        |mut caller: Ctx<'_>, width: i32, height: i32, title_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let title = mem.view().read_cstr(title_ptr)?;
                let (vw, vh) = state.viewport;
                let w = if width == 0 { vw } else { width.max(0) as u32 };
                let h = if height == 0 { vh } else { height.max(0) as u32 };
                state.surface.resize(w, h);
                info!(width = w, height = h, %title, "window initialized");
                state.title = title;
                Ok(())
            })
        },
    )?;
    t.wrap(hi::CLOSE_WINDOW, |caller: Ctx<'_>| {
        caller.data().stop.stop();
    })?;
    t.wrap(hi::WINDOW_SHOULD_CLOSE, |_: Ctx<'_>| -> i32 { 0 })?;
    t.wrap(hi::SET_TARGET_FPS, |mut caller: Ctx<'_>, fps: i32| {
        info!("The game wants to run at {fps} FPS; frames follow the display refresh instead.");
        caller.data_mut().target_fps = fps;
    })?;
    t.wrap(hi::GET_SCREEN_WIDTH, |caller: Ctx<'_>| -> i32 {
        caller.data().surface.width() as i32
    })?;
    t.wrap(hi::GET_SCREEN_HEIGHT, |caller: Ctx<'_>| -> i32 {
        caller.data().surface.height() as i32
    })?;
    t.wrap(hi::GET_FRAME_TIME, |caller: Ctx<'_>| -> f32 {
        caller.data().frame_time()
    })?;
    t.wrap(hi::BEGIN_DRAWING, |_: Ctx<'_>| {})?;
    t.wrap(hi::END_DRAWING, |_: Ctx<'_>| {})?;
    Ok(())
}

fn define_shapes(t: &mut ImportTable<'_>) -> Result<(), HostError> {
    t.wrap(hi::CLEAR_BACKGROUND, |mut caller: Ctx<'_>, color_ptr: u32| {
        with_memory(&mut caller, |mem, state| {
            let color = mem.view().read_color(color_ptr)?;
            draw::clear_background(state.surface.as_mut(), color);
            Ok(())
        })
    })?;
    t.wrap(
        hi::DRAW_CIRCLE,
        |mut caller: Ctx<'_>, x: i32, y: i32, radius: f32, color_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let color = mem.view().read_color(color_ptr)?;
                draw::circle(state.surface.as_mut(), point(x, y), radius, color);
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::DRAW_CIRCLE_V,
        |mut caller: Ctx<'_>, center_ptr: u32, radius: f32, color_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let view = mem.view();
                let center = view.read_vector2(center_ptr)?;
                let color = view.read_color(color_ptr)?;
                draw::circle(state.surface.as_mut(), center, radius, color);
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::DRAW_CIRCLE_LINES,
        |mut caller: Ctx<'_>, x: i32, y: i32, radius: f32, color_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let color = mem.view().read_color(color_ptr)?;
                draw::circle_lines(state.surface.as_mut(), point(x, y), radius, color);
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::DRAW_CIRCLE_LINES_V,
        |mut caller: Ctx<'_>, center_ptr: u32, radius: f32, color_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let view = mem.view();
                let center = view.read_vector2(center_ptr)?;
                let color = view.read_color(color_ptr)?;
                draw::circle_lines(state.surface.as_mut(), center, radius, color);
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::DRAW_RING,
        |mut caller: Ctx<'_>,
         center_ptr: u32,
         inner: f32,
         outer: f32,
         start: f32,
         end: f32,
         _segments: i32,
         color_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let view = mem.view();
                let center = view.read_vector2(center_ptr)?;
                let color = view.read_color(color_ptr)?;
                draw::ring(
                    state.surface.as_mut(),
                    center,
                    inner,
                    outer,
                    start,
                    end,
                    color,
                );
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::DRAW_CIRCLE_GRADIENT,
        |mut caller: Ctx<'_>, x: i32, y: i32, radius: f32, inner_ptr: u32, outer_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let view = mem.view();
                let inner = view.read_color(inner_ptr)?;
                let outer = view.read_color(outer_ptr)?;
                draw::circle_gradient(state.surface.as_mut(), point(x, y), radius, inner, outer);
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::DRAW_RECTANGLE,
        |mut caller: Ctx<'_>, x: i32, y: i32, w: i32, h: i32, color_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let color = mem.view().read_color(color_ptr)?;
                draw::rectangle(state.surface.as_mut(), rect_from_ints(x, y, w, h), color);
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::DRAW_RECTANGLE_REC,
        |mut caller: Ctx<'_>, rec_ptr: u32, color_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let view = mem.view();
                let rec = view.read_rect(rec_ptr)?;
                let color = view.read_color(color_ptr)?;
                draw::rectangle(state.surface.as_mut(), rec, color);
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::DRAW_RECTANGLE_LINES,
        |mut caller: Ctx<'_>, x: i32, y: i32, w: i32, h: i32, color_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let color = mem.view().read_color(color_ptr)?;
                draw::rectangle_lines(state.surface.as_mut(), rect_from_ints(x, y, w, h), color);
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::DRAW_RECTANGLE_LINES_EX,
        |mut caller: Ctx<'_>, rec_ptr: u32, thick: f32, color_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let view = mem.view();
                let rec = view.read_rect(rec_ptr)?;
                let color = view.read_color(color_ptr)?;
                draw::rectangle_lines_ex(state.surface.as_mut(), rec, thick, color);
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::DRAW_TRIANGLE,
        |mut caller: Ctx<'_>, v1: u32, v2: u32, v3: u32, color_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let view = mem.view();
                let (a, b, c) = (
                    view.read_vector2(v1)?,
                    view.read_vector2(v2)?,
                    view.read_vector2(v3)?,
                );
                let color = view.read_color(color_ptr)?;
                draw::triangle(state.surface.as_mut(), a, b, c, color);
                Ok(())
            })
        },
    )?;
    Ok(())
}

/// Font state for a guest `Font` handle, or `None` while the face is still loading or
/// failed to load.
fn custom_font(state: &HostState, handle: u32, size: f32) -> Result<Option<FontSpec>, HostError> {
    let slot = state.assets.font(handle).ok_or(HostError::UnknownHandle {
        kind: "font",
        index: handle,
    })?;
    Ok(slot
        .ready()
        .map(|glyphs| FontSpec::new(size, FontFace::Custom(handle), Some(glyphs.clone()))))
}

/// JavaScript `String.prototype.substring(start, end)` over chars.
fn substring(text: &str, start: i32, end: i32) -> String {
    let len = text.chars().count() as i32;
    let a = start.clamp(0, len) as usize;
    let b = end.clamp(0, len) as usize;
    let (from, to) = if a <= b { (a, b) } else { (b, a) };
    text.chars().skip(from).take(to - from).collect()
}

fn define_text(t: &mut ImportTable<'_>) -> Result<(), HostError> {
    t.wrap(
        hi::DRAW_TEXT,
        |mut caller: Ctx<'_>, text_ptr: u32, x: i32, y: i32, size: i32, color_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let view = mem.view();
                let text = view.read_cstr(text_ptr)?;
                let color = view.read_color(color_ptr)?;
                let glyphs = state.assets.default_font();
                draw::text(
                    state.surface.as_mut(),
                    &text,
                    point(x, y),
                    size as f32,
                    color,
                    glyphs,
                );
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::DRAW_TEXT_EX,
        |mut caller: Ctx<'_>,
         font_ptr: u32,
         text_ptr: u32,
         pos_ptr: u32,
         size: f32,
         _spacing: f32,
         tint_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let view = mem.view();
                let [handle] = view.read_bytes::<1>(font_ptr)?;
                let text = view.read_cstr(text_ptr)?;
                let pos = view.read_vector2(pos_ptr)?;
                let tint = view.read_color(tint_ptr)?;
                if let Some(font) = custom_font(state, handle as u32, size)? {
                    draw::text_ex(state.surface.as_mut(), font, &text, pos, tint);
                }
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::MEASURE_TEXT,
        |mut caller: Ctx<'_>, text_ptr: u32, size: i32| -> wasmtime::Result<i32> {
            with_memory(&mut caller, |mem, state| {
                let text = mem.view().read_cstr(text_ptr)?;
                let glyphs = state.assets.default_font();
                Ok(draw::measure_text(
                    state.surface.as_mut(),
                    &text,
                    size as f32,
                    glyphs,
                ))
            })
        },
    )?;
    t.wrap(
        hi::MEASURE_TEXT_EX,
        |mut caller: Ctx<'_>,
         out_ptr: u32,
         font_ptr: u32,
         text_ptr: u32,
         size: f32,
         _spacing: f32| {
            with_memory(&mut caller, |mem, state| {
                let view = mem.view();
                let [handle] = view.read_bytes::<1>(font_ptr)?;
                let text = view.read_cstr(text_ptr)?;
                let font = custom_font(state, handle as u32, size)?.unwrap_or_else(|| {
                    FontSpec::new(size, FontFace::Custom(handle as u32), None)
                });
                let measured = draw::measure_text_ex(state.surface.as_mut(), font, &text);
                mem.write_vector2(out_ptr, measured)?;
                Ok(())
            })
        },
    )?;
    t.wrap(hi::TEXT_FORMAT, |_: Ctx<'_>, fmt_ptr: u32, _args: u32| -> u32 {
        fmt_ptr
    })?;
    t.wrap(
        hi::TEXT_SUBTEXT,
        |mut caller: Ctx<'_>,
         text_ptr: u32,
         position: i32,
         length: i32|
         -> wasmtime::Result<u32> {
            with_memory(&mut caller, |mem, _state| {
                let text = mem.view().read_cstr(text_ptr)?;
                let mut bytes = substring(&text, position, length).into_bytes();
                bytes.push(0);
                mem.write_bytes(0, &bytes)?;
                Ok(0)
            })
        },
    )?;
    Ok(())
}

fn define_resources(t: &mut ImportTable<'_>) -> Result<(), HostError> {
    t.wrap(
        hi::LOAD_TEXTURE,
        |mut caller: Ctx<'_>, out_ptr: u32, path_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let path = mem.view().read_cstr(path_ptr)?;
                let id = state.assets.load_image(&path);
                let (width, height) = probe_png_size(&state.assets.resolve(&path))
                    .unwrap_or((PLACEHOLDER_TEXTURE_SIZE, PLACEHOLDER_TEXTURE_SIZE));
                debug!(id, %path, width, height, "texture requested");
                mem.write_texture(
                    out_ptr,
                    TextureRecord {
                        id,
                        width,
                        height,
                        mipmaps: 1,
                        format: PIXEL_FORMAT_R8G8B8A8,
                    },
                )?;
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::DRAW_TEXTURE,
        |mut caller: Ctx<'_>, texture_ptr: u32, x: i32, y: i32, _tint_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let texture = mem.view().read_texture(texture_ptr)?;
                let slot = state.assets.image(texture.id).ok_or(HostError::UnknownHandle {
                    kind: "texture",
                    index: texture.id,
                })?;
                if let Slot::Ready(image) = slot {
                    let image = image.clone();
                    draw::texture(state.surface.as_mut(), &image, point(x, y));
                }
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::LOAD_FONT_EX,
        |mut caller: Ctx<'_>,
         out_ptr: u32,
         path_ptr: u32,
         _size: i32,
         _codepoints: u32,
         _count: i32| {
            with_memory(&mut caller, |mem, state| {
                let path = mem.view().read_cstr(path_ptr)?;
                let handle = state.assets.load_font(&path);
                debug!(handle, %path, "font requested");
                mem.write_bytes(out_ptr, &[handle as u8])?;
                Ok(())
            })
        },
    )?;
    t.wrap(hi::GEN_TEXTURE_MIPMAPS, |_: Ctx<'_>, _texture_ptr: u32| {})?;
    t.wrap(
        hi::SET_TEXTURE_FILTER,
        |_: Ctx<'_>, _texture_ptr: u32, _filter: i32| {},
    )?;
    Ok(())
}

fn define_input(t: &mut ImportTable<'_>) -> Result<(), HostError> {
    t.wrap(hi::IS_KEY_DOWN, |caller: Ctx<'_>, key: i32| -> i32 {
        flag(input::lock(&caller.data().input).is_key_down(key))
    })?;
    t.wrap(hi::IS_KEY_PRESSED, |caller: Ctx<'_>, key: i32| -> i32 {
        flag(input::lock(&caller.data().input).is_key_pressed(key))
    })?;
    t.wrap(hi::IS_KEY_RELEASED, |caller: Ctx<'_>, key: i32| -> i32 {
        flag(input::lock(&caller.data().input).is_key_released(key))
    })?;
    t.wrap(hi::IS_KEY_UP, |caller: Ctx<'_>, key: i32| -> i32 {
        flag(input::lock(&caller.data().input).is_key_up(key))
    })?;
    t.wrap(hi::IS_MOUSE_BUTTON_DOWN, |caller: Ctx<'_>, button: i32| -> i32 {
        flag(input::lock(&caller.data().input).is_mouse_down(button))
    })?;
    t.wrap(
        hi::IS_MOUSE_BUTTON_PRESSED,
        |caller: Ctx<'_>, button: i32| -> i32 {
            flag(input::lock(&caller.data().input).is_mouse_pressed(button))
        },
    )?;
    t.wrap(
        hi::IS_MOUSE_BUTTON_RELEASED,
        |caller: Ctx<'_>, button: i32| -> i32 {
            flag(input::lock(&caller.data().input).is_mouse_released(button))
        },
    )?;
    t.wrap(hi::IS_MOUSE_BUTTON_UP, |caller: Ctx<'_>, button: i32| -> i32 {
        flag(input::lock(&caller.data().input).is_mouse_up(button))
    })?;
    t.wrap(hi::GET_MOUSE_POSITION, |mut caller: Ctx<'_>, out_ptr: u32| {
        with_memory(&mut caller, |mem, state| {
            let pos = input::lock(&state.input).mouse_position(state.surface.origin());
            mem.write_vector2(out_ptr, pos)?;
            Ok(())
        })
    })?;
    t.wrap(hi::GET_MOUSE_DELTA, |mut caller: Ctx<'_>, out_ptr: u32| {
        with_memory(&mut caller, |mem, state| {
            let delta = input::lock(&state.input).mouse_delta(state.surface.origin());
            mem.write_vector2(out_ptr, delta)?;
            Ok(())
        })
    })?;
    t.wrap(hi::GET_MOUSE_X, |caller: Ctx<'_>| -> i32 {
        let state = caller.data();
        input::lock(&state.input).mouse_position(state.surface.origin()).x as i32
    })?;
    t.wrap(hi::GET_MOUSE_Y, |caller: Ctx<'_>| -> i32 {
        let state = caller.data();
        input::lock(&state.input).mouse_position(state.surface.origin()).y as i32
    })?;
    t.wrap(hi::GET_MOUSE_WHEEL_MOVE, |caller: Ctx<'_>| -> f32 {
        input::lock(&caller.data().input).wheel_move()
    })?;
    t.wrap(hi::IS_GESTURE_DETECTED, |_: Ctx<'_>, _gesture: i32| -> i32 {
        0
    })?;
    Ok(())
}

fn define_colors(t: &mut ImportTable<'_>) -> Result<(), HostError> {
    t.wrap(
        hi::COLOR_LERP,
        |mut caller: Ctx<'_>, out_ptr: u32, a_ptr: u32, b_ptr: u32, factor: f32| {
            with_memory(&mut caller, |mem, _| {
                let view = mem.view();
                let (a, b) = (view.read_color(a_ptr)?, view.read_color(b_ptr)?);
                mem.write_color(out_ptr, color::lerp(a, b, factor))?;
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::COLOR_BRIGHTNESS,
        |mut caller: Ctx<'_>, out_ptr: u32, color_ptr: u32, factor: f32| {
            with_memory(&mut caller, |mem, _| {
                let c = mem.view().read_color(color_ptr)?;
                mem.write_color(out_ptr, color::brightness(c, factor))?;
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::FADE,
        |mut caller: Ctx<'_>, out_ptr: u32, color_ptr: u32, alpha: f32| {
            with_memory(&mut caller, |mem, _| {
                let c = mem.view().read_color(color_ptr)?;
                mem.write_color(out_ptr, color::fade(c, alpha))?;
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::COLOR_ALPHA,
        |mut caller: Ctx<'_>, out_ptr: u32, color_ptr: u32, alpha: f32| {
            with_memory(&mut caller, |mem, _| {
                let c = mem.view().read_color(color_ptr)?;
                mem.write_color(out_ptr, color::with_alpha(c, alpha))?;
                Ok(())
            })
        },
    )?;
    t.wrap(
        hi::COLOR_FROM_HSV,
        |mut caller: Ctx<'_>, out_ptr: u32, hue: f32, saturation: f32, value: f32| {
            with_memory(&mut caller, |mem, _| {
                mem.write_color(out_ptr, color::from_hsv(hue, saturation, value))?;
                Ok(())
            })
        },
    )?;
    Ok(())
}

fn distance(a: Vector2, b: Vector2) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn define_math(t: &mut ImportTable<'_>) -> Result<(), HostError> {
    t.wrap(hi::LERP, |_: Ctx<'_>, start: f32, end: f32, amount: f32| -> f32 {
        start + amount * (end - start)
    })?;
    t.wrap(hi::POW, |_: Ctx<'_>, value: f64, p: f64| -> f64 {
        value.powf(p)
    })?;
    t.wrap(hi::FMOD, |_: Ctx<'_>, x: f64, y: f64| -> f64 { x % y })?;
    t.wrap(hi::SINF, |_: Ctx<'_>, v: f32| -> f32 { v.sin() })?;
    t.wrap(hi::COSF, |_: Ctx<'_>, v: f32| -> f32 { v.cos() })?;
    t.wrap(
        hi::VECTOR2_DISTANCE,
        |mut caller: Ctx<'_>, a_ptr: u32, b_ptr: u32| -> wasmtime::Result<f32> {
            with_memory(&mut caller, |mem, _| {
                let view = mem.view();
                Ok(distance(view.read_vector2(a_ptr)?, view.read_vector2(b_ptr)?))
            })
        },
    )?;
    t.wrap(
        hi::CHECK_COLLISION_POINT_REC,
        |mut caller: Ctx<'_>, point_ptr: u32, rec_ptr: u32| -> wasmtime::Result<i32> {
            with_memory(&mut caller, |mem, _| {
                let view = mem.view();
                let p = view.read_vector2(point_ptr)?;
                let r = view.read_rect(rec_ptr)?;
                Ok(flag(
                    p.x >= r.x && p.x <= r.x + r.width && p.y >= r.y && p.y <= r.y + r.height,
                ))
            })
        },
    )?;
    t.wrap(
        hi::CHECK_COLLISION_CIRCLES,
        |mut caller: Ctx<'_>,
         c1_ptr: u32,
         r1: f32,
         c2_ptr: u32,
         r2: f32|
         -> wasmtime::Result<i32> {
            with_memory(&mut caller, |mem, _| {
                let view = mem.view();
                let d = distance(view.read_vector2(c1_ptr)?, view.read_vector2(c2_ptr)?);
                Ok(flag(d <= r1 + r2))
            })
        },
    )?;
    t.wrap(
        hi::CHECK_COLLISION_POINT_CIRCLE,
        |mut caller: Ctx<'_>,
         point_ptr: u32,
         center_ptr: u32,
         radius: f32|
         -> wasmtime::Result<i32> {
            with_memory(&mut caller, |mem, _| {
                let view = mem.view();
                let d = distance(view.read_vector2(point_ptr)?, view.read_vector2(center_ptr)?);
                Ok(flag(d <= radius))
            })
        },
    )?;
    Ok(())
}

fn define_libc(t: &mut ImportTable<'_>) -> Result<(), HostError> {
    t.wrap(hi::RAND, |mut caller: Ctx<'_>| -> i32 {
        caller.data_mut().rng.gen_range(0..i32::MAX)
    })?;
    t.wrap(hi::SRAND, |mut caller: Ctx<'_>, seed: u32| {
        caller.data_mut().reseed(seed);
    })?;
    t.wrap(
        hi::TIME,
        |mut caller: Ctx<'_>, out_ptr: u32| -> wasmtime::Result<i32> {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i32)
                .unwrap_or(0);
            if out_ptr != 0 {
                with_memory(&mut caller, |mem, _| Ok(mem.write_i32(out_ptr, now)?))?;
            }
            Ok(now)
        },
    )?;
    Ok(())
}

fn emit_guest_log(level: LogLevel, message: &str) {
    match level {
        LogLevel::Trace => trace!(target: "guest", "{message}"),
        LogLevel::Debug => debug!(target: "guest", "{message}"),
        LogLevel::Warning => warn!(target: "guest", "{message}"),
        LogLevel::Error => error!(target: "guest", "{message}"),
        _ => info!(target: "guest", level = level.label(), "{message}"),
    }
}

fn define_logging(t: &mut ImportTable<'_>) -> Result<(), HostError> {
    t.wrap(hi::SET_TRACE_LOG_LEVEL, |mut caller: Ctx<'_>, level: i32| {
        match LogLevel::from_raw(level) {
            Some(level) => caller.data_mut().log_level = level,
            None => warn!(level, "ignoring unknown trace log level"),
        }
    })?;
    t.wrap(
        hi::TRACE_LOG,
        |mut caller: Ctx<'_>, level: i32, text_ptr: u32, args_ptr: u32| {
            with_memory(&mut caller, |mem, state| {
                let level = LogLevel::from_raw(level).unwrap_or(LogLevel::Info);
                let shown = state.log_level != LogLevel::None && level >= state.log_level;
                if level != LogLevel::Fatal && !shown {
                    return Ok(());
                }
                let view = mem.view();
                let fmt = view.read_cstr(text_ptr)?;
                if level == LogLevel::Fatal {
                    // A bad argument must not hide the fatal message.
                    let message = printf::format(&fmt, &mut GuestVaList::new(view, args_ptr))
                        .unwrap_or_else(|_| fmt);
                    return Err(HostError::FatalLog(message));
                }
                let message = printf::format(&fmt, &mut GuestVaList::new(view, args_ptr))?;
                emit_guest_log(level, &message);
                Ok(())
            })
        },
    )?;
    t.wrap(hi::PRINT_WORD, |mut caller: Ctx<'_>, word_ptr: u32| {
        with_memory(&mut caller, |mem, _| {
            let word = mem.view().read_cstr(word_ptr)?;
            info!(target: "guest", "Word: {word}");
            Ok(())
        })
    })?;
    Ok(())
}

fn define_entry(t: &mut ImportTable<'_>) -> Result<(), HostError> {
    t.wrap(
        hi::SET_ENTRY,
        |mut caller: Ctx<'_>, index: u32| -> wasmtime::Result<()> {
            let table = caller
                .get_export(guest_exports::FUNCTION_TABLE)
                .and_then(Extern::into_table)
                .ok_or(HostError::MissingExport(guest_exports::FUNCTION_TABLE))?;
            let func = table
                .get(&mut caller, u64::from(index))
                .and_then(|r| r.as_func().flatten().copied())
                .ok_or(HostError::BadTableIndex(index))?;
            let entry = func
                .typed::<(), ()>(&caller)
                .map_err(|_| HostError::BadTableIndex(index))?;
            caller.data_mut().entry = Some(entry);
            debug!(index, "per-frame entry registered");
            Ok(())
        },
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_follows_javascript_rules() {
        assert_eq!(substring("wordle", 0, 3), "wor");
        assert_eq!(substring("wordle", 3, 1), "or");
        assert_eq!(substring("wordle", -2, 100), "wordle");
        assert_eq!(substring("wordle", 4, 4), "");
    }

    #[test]
    fn unimplemented_args_render_like_a_js_join() {
        let args = [Val::I32(3), Val::F32(1.5f32.to_bits()), Val::F64(2f64.to_bits())];
        assert_eq!(render_args(&args), "3,1.5,2");
        assert_eq!(render_args(&[]), "");
    }
}
