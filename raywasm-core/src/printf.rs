//! A small `printf` for guest log messages.
//!
//! Arguments come from a wasm32 `va_list`: a pointer into guest memory where each
//! argument sits at the next offset aligned to its own size (4 bytes for `int`, `long`
//! and pointers, 8 bytes for `long long` and `double`).
//!
//! Supported: flags `-` `0` `+` and space, width, precision, length modifiers `h` `hh`
//! `l` `ll` `z`, and conversions `d i u x X o c s f F p %`. Anything else is copied
//! through verbatim.

use crate::memory::{GuestMemory, MemoryError};

/// Source of variadic arguments.
pub trait VaArgs {
    fn next_u32(&mut self) -> Result<u32, MemoryError>;
    fn next_u64(&mut self) -> Result<u64, MemoryError>;
    fn next_f64(&mut self) -> Result<f64, MemoryError>;
    fn next_str(&mut self) -> Result<String, MemoryError>;
}

pub struct GuestVaList<'a> {
    mem: GuestMemory<'a>,
    cursor: u32,
}

impl<'a> GuestVaList<'a> {
    pub fn new(mem: GuestMemory<'a>, ptr: u32) -> Self {
        Self { mem, cursor: ptr }
    }

    fn take(&mut self, size: u32) -> Result<u32, MemoryError> {
        let out_of_bounds = MemoryError::OutOfBounds {
            ptr: self.cursor,
            len: size as usize,
        };
        let at = self
            .cursor
            .checked_next_multiple_of(size)
            .ok_or(out_of_bounds.clone())?;
        self.cursor = at.checked_add(size).ok_or(out_of_bounds)?;
        Ok(at)
    }
}

impl VaArgs for GuestVaList<'_> {
    fn next_u32(&mut self) -> Result<u32, MemoryError> {
        let at = self.take(4)?;
        Ok(u32::from_le_bytes(self.mem.read_bytes::<4>(at)?))
    }

    fn next_u64(&mut self) -> Result<u64, MemoryError> {
        let at = self.take(8)?;
        Ok(u64::from_le_bytes(self.mem.read_bytes::<8>(at)?))
    }

    fn next_f64(&mut self) -> Result<f64, MemoryError> {
        Ok(f64::from_bits(self.next_u64()?))
    }

    fn next_str(&mut self) -> Result<String, MemoryError> {
        let ptr = self.next_u32()?;
        if ptr == 0 {
            return Ok("(null)".to_owned());
        }
        self.mem.read_cstr(ptr)
    }
}

#[derive(Default)]
struct Spec {
    left: bool,
    zero: bool,
    plus: bool,
    space: bool,
    width: usize,
    precision: Option<usize>,
    wide: bool,
}

impl Spec {
    fn pad(&self, body: String, numeric: bool) -> String {
        let len = body.chars().count();
        if len >= self.width {
            return body;
        }
        let fill = self.width - len;
        if self.left {
            format!("{body}{}", " ".repeat(fill))
        } else if self.zero && numeric {
            let (sign, digits) = match body.chars().next() {
                Some(c @ ('-' | '+' | ' ')) => (c.to_string(), &body[1..]),
                _ => (String::new(), &body[..]),
            };
            format!("{sign}{}{digits}", "0".repeat(fill))
        } else {
            format!("{}{body}", " ".repeat(fill))
        }
    }

    fn signed(&self, v: i64) -> String {
        let digits = self.digits(v.unsigned_abs().to_string());
        if v < 0 {
            format!("-{digits}")
        } else if self.plus {
            format!("+{digits}")
        } else if self.space {
            format!(" {digits}")
        } else {
            digits
        }
    }

    /// Apply an integer precision (minimum digit count).
    fn digits(&self, raw: String) -> String {
        match self.precision {
            Some(p) if raw.len() < p => format!("{}{raw}", "0".repeat(p - raw.len())),
            _ => raw,
        }
    }
}

/// Expand `fmt` against `args`.
pub fn format(fmt: &str, args: &mut impl VaArgs) -> Result<String, MemoryError> {
    let mut out = String::with_capacity(fmt.len());
    let mut chars = fmt.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let mut spec = Spec::default();
        let mut raw = String::from('%');

        while let Some(&f) = chars.peek() {
            match f {
                '-' => spec.left = true,
                '0' => spec.zero = true,
                '+' => spec.plus = true,
                ' ' => spec.space = true,
                _ => break,
            }
            raw.push(f);
            chars.next();
        }
        while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
            spec.width = spec.width * 10 + d as usize;
            raw.push(chars.next().unwrap_or_default());
        }
        if chars.peek() == Some(&'.') {
            raw.push('.');
            chars.next();
            let mut p = 0;
            while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                p = p * 10 + d as usize;
                raw.push(chars.next().unwrap_or_default());
            }
            spec.precision = Some(p);
        }
        while let Some(&m) = chars.peek() {
            match m {
                'h' | 'z' | 'j' | 't' => {}
                'l' => {
                    // `l` is 32-bit on wasm32, `ll` is 64-bit.
                    if raw.ends_with('l') {
                        spec.wide = true;
                    }
                }
                _ => break,
            }
            raw.push(m);
            chars.next();
        }

        let Some(conv) = chars.next() else {
            out.push_str(&raw);
            break;
        };
        let body = match conv {
            '%' => {
                out.push('%');
                continue;
            }
            'd' | 'i' => {
                let v = if spec.wide {
                    args.next_u64()? as i64
                } else {
                    args.next_u32()? as i32 as i64
                };
                spec.pad(spec.signed(v), true)
            }
            'u' | 'x' | 'X' | 'o' => {
                let v = if spec.wide {
                    args.next_u64()?
                } else {
                    args.next_u32()? as u64
                };
                let raw = match conv {
                    'u' => v.to_string(),
                    'x' => format!("{v:x}"),
                    'X' => format!("{v:X}"),
                    _ => format!("{v:o}"),
                };
                spec.pad(spec.digits(raw), true)
            }
            'c' => {
                let v = args.next_u32()?;
                let ch = char::from(v as u8);
                spec.pad(ch.to_string(), false)
            }
            's' => {
                let mut s = args.next_str()?;
                if let Some(p) = spec.precision {
                    s = s.chars().take(p).collect();
                }
                spec.pad(s, false)
            }
            'f' | 'F' => {
                let v = args.next_f64()?;
                let p = spec.precision.unwrap_or(6);
                let body = if v.is_sign_negative() || !(spec.plus || spec.space) {
                    format!("{v:.p$}")
                } else if spec.plus {
                    format!("+{v:.p$}")
                } else {
                    format!(" {v:.p$}")
                };
                spec.pad(body, v.is_finite())
            }
            'p' => {
                let v = args.next_u32()?;
                spec.pad(format!("0x{v:x}"), false)
            }
            other => {
                raw.push(other);
                raw
            }
        };
        out.push_str(&body);
    }

    Ok(out)
}
