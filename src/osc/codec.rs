//! OSC 1.0 binary codec.
//!
//! Packet layout:
//!
//! ```text
//! message: [address OSC-string] [",tags" OSC-string] [arguments...]
//! bundle:  ["#bundle" OSC-string] [u64 BE timetag] ([i32 BE size] [element])*
//! ```
//!
//! OSC-strings are NUL-terminated and zero-padded to a multiple of 4 bytes.
//! Numeric arguments are big-endian. Bundles are flattened into their
//! messages in order; timetags are ignored.

use anyhow::{anyhow, bail, Context, Result};

use super::{OscArg, OscMessage};

/// Marker that starts a bundle.
const BUNDLE_TAG: &str = "#bundle";

/// Deepest bundle nesting accepted on decode.
const MAX_BUNDLE_DEPTH: usize = 8;

/// Encode a message into an OSC packet.
///
/// # Errors
///
/// Returns an error if the address or a string argument contains NUL, or a
/// blob exceeds 2 GiB.
pub fn encode(message: &OscMessage) -> Result<Vec<u8>> {
    if !message.address.starts_with('/') {
        bail!("OSC address must start with '/': {:?}", message.address);
    }
    let mut buf = Vec::with_capacity(64);
    write_string(&mut buf, &message.address)?;

    let mut tags = String::with_capacity(message.args.len() + 1);
    tags.push(',');
    tags.extend(message.args.iter().map(OscArg::type_tag));
    write_string(&mut buf, &tags)?;

    for arg in &message.args {
        match arg {
            OscArg::Int(i) => buf.extend_from_slice(&i.to_be_bytes()),
            OscArg::Float(f) => buf.extend_from_slice(&f.to_be_bytes()),
            OscArg::String(s) => write_string(&mut buf, s)?,
            OscArg::Long(l) => buf.extend_from_slice(&l.to_be_bytes()),
            OscArg::Double(d) => buf.extend_from_slice(&d.to_be_bytes()),
            OscArg::Bool(_) | OscArg::Nil => {}
            OscArg::Blob(data) => {
                let len = i32::try_from(data.len()).context("OSC blob too large")?;
                buf.extend_from_slice(&len.to_be_bytes());
                buf.extend_from_slice(data);
                pad(&mut buf);
            }
        }
    }
    Ok(buf)
}

/// Decode an OSC packet (message or bundle) into its messages.
///
/// # Errors
///
/// Returns an error if the packet is truncated, misaligned, or uses an
/// unsupported type tag.
pub fn decode(packet: &[u8]) -> Result<Vec<OscMessage>> {
    let mut out = Vec::new();
    decode_into(packet, 0, &mut out)?;
    Ok(out)
}

fn decode_into(packet: &[u8], depth: usize, out: &mut Vec<OscMessage>) -> Result<()> {
    if packet.first() == Some(&b'#') {
        if depth >= MAX_BUNDLE_DEPTH {
            bail!("OSC bundle nested too deeply");
        }
        let mut reader = Reader::new(packet);
        let tag = reader.string()?;
        if tag != BUNDLE_TAG {
            bail!("unknown OSC packet marker {tag:?}");
        }
        reader.take(8).context("OSC bundle missing timetag")?;
        while !reader.is_empty() {
            let size = reader.i32()?;
            let size = usize::try_from(size).context("negative bundle element size")?;
            let element = reader.take(size)?;
            decode_into(element, depth + 1, out)?;
        }
        Ok(())
    } else {
        out.push(decode_message(packet)?);
        Ok(())
    }
}

fn decode_message(packet: &[u8]) -> Result<OscMessage> {
    let mut reader = Reader::new(packet);
    let address = reader.string().context("OSC address")?;
    if !address.starts_with('/') {
        bail!("OSC address must start with '/': {address:?}");
    }

    // A message without a type tag string is legal (old peers); no args.
    if reader.is_empty() {
        return Ok(OscMessage { address, args: Vec::new() });
    }
    let tags = reader.string().context("OSC type tags")?;
    let Some(tags) = tags.strip_prefix(',') else {
        bail!("OSC type tags must start with ',': {tags:?}");
    };

    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.chars() {
        let arg = match tag {
            'i' => OscArg::Int(reader.i32()?),
            'f' => OscArg::Float(f32::from_be_bytes(reader.array()?)),
            's' | 'S' => OscArg::String(reader.string()?),
            'h' => OscArg::Long(i64::from_be_bytes(reader.array()?)),
            'd' => OscArg::Double(f64::from_be_bytes(reader.array()?)),
            'T' => OscArg::Bool(true),
            'F' => OscArg::Bool(false),
            'N' | 'I' => OscArg::Nil,
            'b' => {
                let len = usize::try_from(reader.i32()?).context("negative OSC blob length")?;
                let data = reader.take(len)?.to_vec();
                reader.skip_padding(len)?;
                OscArg::Blob(data)
            }
            other => bail!("unsupported OSC type tag '{other}'"),
        };
        args.push(arg);
    }
    Ok(OscMessage { address, args })
}

fn write_string(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    if s.contains('\0') {
        bail!("OSC string contains NUL: {s:?}");
    }
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    pad(buf);
    Ok(())
}

fn pad(buf: &mut Vec<u8>) {
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

/// Cursor over a packet, enforcing 4-byte alignment.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| anyhow!("OSC packet truncated at byte {}", self.pos))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    fn skip_padding(&mut self, len: usize) -> Result<()> {
        let padding = (4 - len % 4) % 4;
        self.take(padding)?;
        Ok(())
    }

    fn string(&mut self) -> Result<String> {
        let rest = &self.data[self.pos.min(self.data.len())..];
        let nul = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| anyhow!("unterminated OSC string at byte {}", self.pos))?;
        let text = std::str::from_utf8(&rest[..nul]).context("OSC string is not UTF-8")?;
        let text = text.to_string();
        self.take(nul + 1)?;
        self.skip_padding(nul + 1)?;
        Ok(text)
    }
}
