//! Fixed binary framing for a [`Tuple`], used only to spill sort runs to
//! disk (`sort.rs`). Wire shape per value: a one-byte tag, then the raw
//! payload for non-null fixed-width types, or a `u32` length prefix plus
//! bytes for `Str`/`Binary`. This is a private, spill-only format -- it is
//! not the §4.1 hash byte layout, which never frames length or nullness.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};
use value::{JoinError, JoinResult, Tuple, TypeId, Value};

const TAG_NULL_INT32: u8 = 0;
const TAG_INT32: u8 = 1;
const TAG_NULL_INT64: u8 = 2;
const TAG_INT64: u8 = 3;
const TAG_NULL_FLOAT64: u8 = 4;
const TAG_FLOAT64: u8 = 5;
const TAG_NULL_BOOL: u8 = 6;
const TAG_BOOL: u8 = 7;
const TAG_NULL_STR: u8 = 8;
const TAG_STR: u8 = 9;
const TAG_NULL_BINARY: u8 = 10;
const TAG_BINARY: u8 = 11;

fn write_value<W: Write>(w: &mut W, v: &Value) -> io::Result<()> {
    match v {
        Value::Null(TypeId::Int32) => w.write_u8(TAG_NULL_INT32),
        Value::Null(TypeId::Int64) => w.write_u8(TAG_NULL_INT64),
        Value::Null(TypeId::Float64) => w.write_u8(TAG_NULL_FLOAT64),
        Value::Null(TypeId::Bool) => w.write_u8(TAG_NULL_BOOL),
        Value::Null(TypeId::Str) => w.write_u8(TAG_NULL_STR),
        Value::Null(TypeId::Binary) => w.write_u8(TAG_NULL_BINARY),
        Value::Int32(x) => {
            w.write_u8(TAG_INT32)?;
            w.write_i32::<LittleEndian>(*x)
        }
        Value::Int64(x) => {
            w.write_u8(TAG_INT64)?;
            w.write_i64::<LittleEndian>(*x)
        }
        Value::Float64(x) => {
            w.write_u8(TAG_FLOAT64)?;
            w.write_f64::<LittleEndian>(*x)
        }
        Value::Bool(b) => {
            w.write_u8(TAG_BOOL)?;
            w.write_u8(if *b { 1 } else { 0 })
        }
        Value::Str(s) => {
            w.write_u8(TAG_STR)?;
            w.write_u32::<LittleEndian>(s.len() as u32)?;
            w.write_all(s.as_bytes())
        }
        Value::Binary(b) => {
            w.write_u8(TAG_BINARY)?;
            w.write_u32::<LittleEndian>(b.len() as u32)?;
            w.write_all(b)
        }
    }
}

fn read_value<R: Read>(r: &mut R) -> JoinResult<Value> {
    let tag = r.read_u8().map_err(io_err)?;
    Ok(match tag {
        TAG_NULL_INT32 => Value::Null(TypeId::Int32),
        TAG_NULL_INT64 => Value::Null(TypeId::Int64),
        TAG_NULL_FLOAT64 => Value::Null(TypeId::Float64),
        TAG_NULL_BOOL => Value::Null(TypeId::Bool),
        TAG_NULL_STR => Value::Null(TypeId::Str),
        TAG_NULL_BINARY => Value::Null(TypeId::Binary),
        TAG_INT32 => Value::Int32(r.read_i32::<LittleEndian>().map_err(io_err)?),
        TAG_INT64 => Value::Int64(r.read_i64::<LittleEndian>().map_err(io_err)?),
        TAG_FLOAT64 => Value::Float64(r.read_f64::<LittleEndian>().map_err(io_err)?),
        TAG_BOOL => Value::Bool(r.read_u8().map_err(io_err)? != 0),
        TAG_STR => {
            let len = r.read_u32::<LittleEndian>().map_err(io_err)? as usize;
            let mut buf = vec![0u8; len];
            r.read_exact(&mut buf).map_err(io_err)?;
            Value::Str(String::from_utf8(buf).map_err(|e| JoinError::Invariant(e.to_string()))?)
        }
        TAG_BINARY => {
            let len = r.read_u32::<LittleEndian>().map_err(io_err)? as usize;
            let mut buf = vec![0u8; len];
            r.read_exact(&mut buf).map_err(io_err)?;
            Value::Binary(buf)
        }
        other => return Err(JoinError::Invariant(format!("unknown value tag {other} in spill file"))),
    })
}

fn io_err(e: io::Error) -> JoinError {
    JoinError::Invariant(format!("spill file I/O: {e}"))
}

/// Encodes one tuple as `[width: u32 LE][value...]`.
pub fn encode_tuple(tuple: &[Value]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_u32::<LittleEndian>(tuple.len() as u32).expect("vec write");
    for v in tuple {
        write_value(&mut buf, v).expect("vec write");
    }
    buf
}

/// Reads one tuple previously written by [`encode_tuple`]. Returns `Ok(None)`
/// at a clean end-of-stream (no bytes read at all).
pub fn decode_tuple<R: Read>(r: &mut R) -> JoinResult<Option<Tuple>> {
    let width = match r.read_u32::<LittleEndian>() {
        Ok(w) => w,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(io_err(e)),
    };
    let mut tuple = Vec::with_capacity(width as usize);
    for _ in 0..width {
        tuple.push(read_value(r)?);
    }
    Ok(Some(tuple))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_type() {
        let tuple = vec![
            Value::Int32(7),
            Value::Null(TypeId::Int64),
            Value::Float64(1.5),
            Value::Bool(true),
            Value::Str("hi".to_string()),
            Value::Binary(vec![1, 2, 3]),
        ];
        let bytes = encode_tuple(&tuple);
        let mut cursor = io::Cursor::new(bytes);
        let back = decode_tuple(&mut cursor).unwrap().unwrap();
        assert_eq!(back, tuple);
    }

    #[test]
    fn decode_on_empty_stream_is_none() {
        let mut cursor = io::Cursor::new(Vec::<u8>::new());
        assert!(decode_tuple(&mut cursor).unwrap().is_none());
    }
}
