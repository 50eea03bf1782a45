//! Typed access to the guest's linear memory.
//!
//! A view is built from the calling instance's `memory` export at the start of every
//! host call and dropped when the call returns. The guest may grow its memory between
//! calls, which can move the backing buffer, so views are never cached.
//!
//! All multi-byte values are little-endian, matching wasm32.

use wasmtime::{Caller, Extern, Memory};

use crate::abi::guest_exports;
use crate::surface::Color;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("guest does not export its linear memory")]
    MissingMemory,
    #[error("guest memory access out of range: {len} bytes at {ptr:#x}")]
    OutOfBounds { ptr: u32, len: usize },
    #[error("string at {ptr:#x} runs off the end of guest memory")]
    Unterminated { ptr: u32 },
}

/// Two `f32`s (x, y).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

/// Four `f32`s (x, y, width, height).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The guest's `Texture2D` record: five `u32`s.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TextureRecord {
    pub id: u32,
    pub width: u32,
    pub height: u32,
    pub mipmaps: u32,
    pub format: u32,
}

/// Look up the calling instance's memory export.
pub fn resolve<T>(caller: &mut Caller<'_, T>) -> Result<Memory, MemoryError> {
    caller
        .get_export(guest_exports::MEMORY)
        .and_then(Extern::into_memory)
        .ok_or(MemoryError::MissingMemory)
}

/// Read-only view over guest memory.
#[derive(Clone, Copy)]
pub struct GuestMemory<'a> {
    bytes: &'a [u8],
}

impl<'a> GuestMemory<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn slice(&self, ptr: u32, len: usize) -> Result<&'a [u8], MemoryError> {
        let start = ptr as usize;
        start
            .checked_add(len)
            .and_then(|end| self.bytes.get(start..end))
            .ok_or(MemoryError::OutOfBounds { ptr, len })
    }

    pub fn read_bytes<const N: usize>(&self, ptr: u32) -> Result<[u8; N], MemoryError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.slice(ptr, N)?);
        Ok(out)
    }

    pub fn read_f32s<const N: usize>(&self, ptr: u32) -> Result<[f32; N], MemoryError> {
        let raw = self.slice(ptr, N * 4)?;
        let mut out = [0f32; N];
        for (dst, chunk) in out.iter_mut().zip(raw.chunks_exact(4)) {
            *dst = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(out)
    }

    pub fn read_u32s<const N: usize>(&self, ptr: u32) -> Result<[u32; N], MemoryError> {
        let raw = self.slice(ptr, N * 4)?;
        let mut out = [0u32; N];
        for (dst, chunk) in out.iter_mut().zip(raw.chunks_exact(4)) {
            *dst = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        Ok(out)
    }

    pub fn read_color(&self, ptr: u32) -> Result<Color, MemoryError> {
        let [r, g, b, a] = self.read_bytes::<4>(ptr)?;
        Ok(Color::new(r, g, b, a))
    }

    pub fn read_vector2(&self, ptr: u32) -> Result<Vector2, MemoryError> {
        let [x, y] = self.read_f32s::<2>(ptr)?;
        Ok(Vector2 { x, y })
    }

    pub fn read_rect(&self, ptr: u32) -> Result<Rectangle, MemoryError> {
        let [x, y, width, height] = self.read_f32s::<4>(ptr)?;
        Ok(Rectangle {
            x,
            y,
            width,
            height,
        })
    }

    pub fn read_texture(&self, ptr: u32) -> Result<TextureRecord, MemoryError> {
        let [id, width, height, mipmaps, format] = self.read_u32s::<5>(ptr)?;
        Ok(TextureRecord {
            id,
            width,
            height,
            mipmaps,
            format,
        })
    }

    /// Read a NUL-terminated string. Invalid UTF-8 is replaced, not rejected.
    pub fn read_cstr(&self, ptr: u32) -> Result<String, MemoryError> {
        let tail = self
            .bytes
            .get(ptr as usize..)
            .ok_or(MemoryError::OutOfBounds { ptr, len: 1 })?;
        let len = tail
            .iter()
            .position(|&b| b == 0)
            .ok_or(MemoryError::Unterminated { ptr })?;
        Ok(String::from_utf8_lossy(&tail[..len]).into_owned())
    }
}

/// Mutable view over guest memory, used by imports that return records through a pointer.
pub struct GuestMemoryMut<'a> {
    bytes: &'a mut [u8],
}

impl<'a> GuestMemoryMut<'a> {
    pub fn new(bytes: &'a mut [u8]) -> Self {
        Self { bytes }
    }

    pub fn view(&self) -> GuestMemory<'_> {
        GuestMemory::new(&self.bytes[..])
    }

    pub fn write_bytes(&mut self, ptr: u32, data: &[u8]) -> Result<(), MemoryError> {
        let start = ptr as usize;
        let dst = start
            .checked_add(data.len())
            .and_then(|end| self.bytes.get_mut(start..end))
            .ok_or(MemoryError::OutOfBounds {
                ptr,
                len: data.len(),
            })?;
        dst.copy_from_slice(data);
        Ok(())
    }

    pub fn write_f32s(&mut self, ptr: u32, values: &[f32]) -> Result<(), MemoryError> {
        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.write_bytes(ptr, &raw)
    }

    pub fn write_u32s(&mut self, ptr: u32, values: &[u32]) -> Result<(), MemoryError> {
        let raw: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.write_bytes(ptr, &raw)
    }

    pub fn write_i32(&mut self, ptr: u32, value: i32) -> Result<(), MemoryError> {
        self.write_bytes(ptr, &value.to_le_bytes())
    }

    pub fn write_color(&mut self, ptr: u32, color: Color) -> Result<(), MemoryError> {
        self.write_bytes(ptr, &[color.r, color.g, color.b, color.a])
    }

    pub fn write_vector2(&mut self, ptr: u32, v: Vector2) -> Result<(), MemoryError> {
        self.write_f32s(ptr, &[v.x, v.y])
    }

    pub fn write_texture(&mut self, ptr: u32, t: TextureRecord) -> Result<(), MemoryError> {
        self.write_u32s(ptr, &[t.id, t.width, t.height, t.mipmaps, t.format])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_records() {
        let mut bytes = vec![0u8; 64];
        bytes[8..12].copy_from_slice(&1.5f32.to_le_bytes());
        bytes[12..16].copy_from_slice(&(-2.0f32).to_le_bytes());
        bytes[20..24].copy_from_slice(&[255, 0, 128, 255]);

        let mem = GuestMemory::new(&bytes);
        assert_eq!(mem.read_vector2(8).unwrap(), Vector2 { x: 1.5, y: -2.0 });
        assert_eq!(mem.read_color(20).unwrap(), Color::new(255, 0, 128, 255));
    }

    #[test]
    fn cstr_stops_at_nul_and_replaces_bad_utf8() {
        let mut bytes = b"hello\0world\0".to_vec();
        bytes.extend_from_slice(&[0xff, b'x', 0]);
        let mem = GuestMemory::new(&bytes);
        assert_eq!(mem.read_cstr(0).unwrap(), "hello");
        assert_eq!(mem.read_cstr(6).unwrap(), "world");
        assert_eq!(mem.read_cstr(12).unwrap(), "\u{fffd}x");
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let bytes = b"abc".to_vec();
        let mem = GuestMemory::new(&bytes);
        assert_eq!(mem.read_cstr(0), Err(MemoryError::Unterminated { ptr: 0 }));
    }

    #[test]
    fn out_of_range_reads_and_writes_are_rejected() {
        let mut bytes = vec![0u8; 8];
        assert!(matches!(
            GuestMemory::new(&bytes).read_rect(0),
            Err(MemoryError::OutOfBounds { ptr: 0, len: 16 })
        ));
        let mut mem = GuestMemoryMut::new(&mut bytes);
        assert!(mem.write_f32s(6, &[1.0]).is_err());
        assert!(mem.write_f32s(4, &[1.0]).is_ok());
    }

    #[test]
    fn texture_record_round_trips_through_memory() {
        let mut bytes = vec![0u8; 32];
        let record = TextureRecord {
            id: 3,
            width: 64,
            height: 32,
            mipmaps: 1,
            format: 7,
        };
        let mut mem = GuestMemoryMut::new(&mut bytes);
        mem.write_texture(4, record).unwrap();
        assert_eq!(mem.view().read_texture(4).unwrap(), record);
    }
}
