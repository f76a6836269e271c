#![allow(dead_code)]

use std::io;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Mutex;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::framebuffer::Color4;
use crate::renderer::{CallbackStatus, FrameInfo, RenderCallbacks, TileInfo};

/// Default TCP port the viewer listens on.
pub const DEFAULT_PORT: u16 = 50505;

const MSG_RENDER_FRAME_START: i32 = 1;
const MSG_RENDER_FRAME_DONE: i32 = 2;
const MSG_RENDER_FRAME_ABORT: i32 = 3;
const MSG_RENDER_TILE_START: i32 = 4;
const MSG_RENDER_TILE_DONE: i32 = 5;
const MSG_REPLY_OK: i32 = 6;

/// A single viewer-protocol message. Each variant mirrors one row of the
/// wire table: little-endian i32 header `{size_of_body, type}` followed by
/// the body fields named here.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    RenderFrameStart { frame_id: i32, xres: i32, yres: i32, channel_count: i32, tile_count: i32 },
    RenderFrameDone { frame_id: i32 },
    RenderFrameAbort { frame_id: i32 },
    RenderTileStart { frame_id: i32, tile_id: i32, xmin: i32, ymin: i32, xmax: i32, ymax: i32 },
    RenderTileDone { frame_id: i32, tile_id: i32, xmin: i32, ymin: i32, xmax: i32, ymax: i32, pixels: Vec<f32> },
    ReplyOk { frame_id: i32 },
}

impl Message {
    fn msg_type(&self) -> i32 {
        match self {
            Message::RenderFrameStart { .. } => MSG_RENDER_FRAME_START,
            Message::RenderFrameDone { .. } => MSG_RENDER_FRAME_DONE,
            Message::RenderFrameAbort { .. } => MSG_RENDER_FRAME_ABORT,
            Message::RenderTileStart { .. } => MSG_RENDER_TILE_START,
            Message::RenderTileDone { .. } => MSG_RENDER_TILE_DONE,
            Message::ReplyOk { .. } => MSG_REPLY_OK,
        }
    }

    /// Body length in bytes, not counting the `{size_of_body, type}` header
    /// itself -- matches the original protocol's `size = sizeof(msg) -
    /// sizeof(msg[0])`, i.e. everything after the size field, type included.
    fn body_len(&self) -> i32 {
        let i32_count = match self {
            Message::RenderFrameStart { .. } => 5,
            Message::RenderFrameDone { .. } => 1,
            Message::RenderFrameAbort { .. } => 1,
            Message::RenderTileStart { .. } => 6,
            Message::RenderTileDone { pixels, .. } => 6 + 2 * pixels.len() as i32,
            Message::ReplyOk { .. } => 1,
        };
        i32_count * 4
    }

    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_i32::<LittleEndian>(self.body_len())?;
        w.write_i32::<LittleEndian>(self.msg_type())?;
        match self {
            Message::RenderFrameStart { frame_id, xres, yres, channel_count, tile_count } => {
                w.write_i32::<LittleEndian>(*frame_id)?;
                w.write_i32::<LittleEndian>(*xres)?;
                w.write_i32::<LittleEndian>(*yres)?;
                w.write_i32::<LittleEndian>(*channel_count)?;
                w.write_i32::<LittleEndian>(*tile_count)?;
            }
            Message::RenderFrameDone { frame_id } | Message::RenderFrameAbort { frame_id } | Message::ReplyOk { frame_id } => {
                w.write_i32::<LittleEndian>(*frame_id)?;
            }
            Message::RenderTileStart { frame_id, tile_id, xmin, ymin, xmax, ymax } => {
                w.write_i32::<LittleEndian>(*frame_id)?;
                w.write_i32::<LittleEndian>(*tile_id)?;
                w.write_i32::<LittleEndian>(*xmin)?;
                w.write_i32::<LittleEndian>(*ymin)?;
                w.write_i32::<LittleEndian>(*xmax)?;
                w.write_i32::<LittleEndian>(*ymax)?;
            }
            Message::RenderTileDone { frame_id, tile_id, xmin, ymin, xmax, ymax, pixels } => {
                w.write_i32::<LittleEndian>(*frame_id)?;
                w.write_i32::<LittleEndian>(*tile_id)?;
                w.write_i32::<LittleEndian>(*xmin)?;
                w.write_i32::<LittleEndian>(*ymin)?;
                w.write_i32::<LittleEndian>(*xmax)?;
                w.write_i32::<LittleEndian>(*ymax)?;
                for p in pixels {
                    w.write_f32::<LittleEndian>(*p)?;
                }
            }
        }
        Ok(())
    }

    pub fn decode<R: Read>(r: &mut R) -> io::Result<Message> {
        let size_of_body = r.read_i32::<LittleEndian>()?;
        let msg_type = r.read_i32::<LittleEndian>()?;
        let remaining = (size_of_body as usize) - 4;

        let msg = match msg_type {
            MSG_RENDER_FRAME_START => Message::RenderFrameStart {
                frame_id: r.read_i32::<LittleEndian>()?,
                xres: r.read_i32::<LittleEndian>()?,
                yres: r.read_i32::<LittleEndian>()?,
                channel_count: r.read_i32::<LittleEndian>()?,
                tile_count: r.read_i32::<LittleEndian>()?,
            },
            MSG_RENDER_FRAME_DONE => Message::RenderFrameDone { frame_id: r.read_i32::<LittleEndian>()? },
            MSG_RENDER_FRAME_ABORT => Message::RenderFrameAbort { frame_id: r.read_i32::<LittleEndian>()? },
            MSG_RENDER_TILE_START => Message::RenderTileStart {
                frame_id: r.read_i32::<LittleEndian>()?,
                tile_id: r.read_i32::<LittleEndian>()?,
                xmin: r.read_i32::<LittleEndian>()?,
                ymin: r.read_i32::<LittleEndian>()?,
                xmax: r.read_i32::<LittleEndian>()?,
                ymax: r.read_i32::<LittleEndian>()?,
            },
            MSG_RENDER_TILE_DONE => {
                let frame_id = r.read_i32::<LittleEndian>()?;
                let tile_id = r.read_i32::<LittleEndian>()?;
                let xmin = r.read_i32::<LittleEndian>()?;
                let ymin = r.read_i32::<LittleEndian>()?;
                let xmax = r.read_i32::<LittleEndian>()?;
                let ymax = r.read_i32::<LittleEndian>()?;
                let npixels = (remaining - 6 * 4) / 4;
                let mut pixels = Vec::with_capacity(npixels);
                for _ in 0..npixels {
                    pixels.push(r.read_f32::<LittleEndian>()?);
                }
                Message::RenderTileDone { frame_id, tile_id, xmin, ymin, xmax, ymax, pixels }
            }
            MSG_REPLY_OK => Message::ReplyOk { frame_id: r.read_i32::<LittleEndian>()? },
            _ => return Err(io::Error::new(io::ErrorKind::InvalidData, "unrecognized viewer message type")),
        };
        Ok(msg)
    }
}

/// A minimal loopback listener for driving the protocol end to end in
/// tests, without a real viewer client attached. Accepts one connection
/// and records every message sent to it.
pub struct MockViewer {
    listener: TcpListener,
}

impl MockViewer {
    pub fn bind() -> io::Result<MockViewer> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        Ok(MockViewer { listener })
    }

    pub fn local_addr(&self) -> io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts the single connection the renderer will make, then reads
    /// exactly `count` messages off it.
    pub fn accept_and_record(&self, count: usize) -> io::Result<Vec<Message>> {
        let (mut stream, _) = self.listener.accept()?;
        let mut messages = Vec::with_capacity(count);
        for _ in 0..count {
            messages.push(Message::decode(&mut stream)?);
        }
        Ok(messages)
    }
}

/// A connection to a viewer, used by the renderer driver to report
/// progress when viewer-reporting is enabled.
pub struct ViewerConnection {
    stream: TcpStream,
}

impl ViewerConnection {
    pub fn connect(addr: std::net::SocketAddr) -> io::Result<ViewerConnection> {
        Ok(ViewerConnection { stream: TcpStream::connect(addr)? })
    }

    pub fn send(&mut self, message: &Message) -> io::Result<()> {
        message.encode(&mut self.stream)
    }
}

/// Bridges `Renderer::render_scene` to a viewer connection: every frame and
/// tile callback is forwarded as the matching wire message. Tile callbacks
/// run concurrently across worker threads, so the connection sits behind a
/// `Mutex` -- sends serialize, they never need to run in parallel anyway.
pub struct ViewerReportCallbacks {
    conn: Mutex<ViewerConnection>,
}

impl ViewerReportCallbacks {
    pub fn new(conn: ViewerConnection) -> ViewerReportCallbacks {
        ViewerReportCallbacks { conn: Mutex::new(conn) }
    }

    fn send(&self, message: Message) {
        if let Err(e) = self.conn.lock().unwrap().send(&message) {
            eprintln!("viewer report: {}", e);
        }
    }
}

impl RenderCallbacks for ViewerReportCallbacks {
    fn frame_start(&self, info: &FrameInfo) -> CallbackStatus {
        self.send(Message::RenderFrameStart {
            frame_id: info.frame_id,
            xres: info.resolution.0 as i32,
            yres: info.resolution.1 as i32,
            channel_count: 4,
            tile_count: info.tile_count as i32,
        });
        CallbackStatus::Continue
    }

    fn frame_done(&self, info: &FrameInfo) {
        self.send(Message::RenderFrameDone { frame_id: info.frame_id });
    }

    fn tile_start(&self, info: &TileInfo) -> CallbackStatus {
        let (xmin, ymin, xmax, ymax) = info.region;
        self.send(Message::RenderTileStart {
            frame_id: info.frame_id,
            tile_id: info.tile_id as i32,
            xmin: xmin as i32,
            ymin: ymin as i32,
            xmax: xmax as i32,
            ymax: ymax as i32,
        });
        CallbackStatus::Continue
    }

    fn tile_done(&self, info: &TileInfo, pixels: &[Color4]) {
        let (xmin, ymin, xmax, ymax) = info.region;
        let mut flat = Vec::with_capacity(pixels.len() * 4);
        for p in pixels {
            flat.push(p.r);
            flat.push(p.g);
            flat.push(p.b);
            flat.push(p.a);
        }
        self.send(Message::RenderTileDone {
            frame_id: info.frame_id,
            tile_id: info.tile_id as i32,
            xmin: xmin as i32,
            ymin: ymin as i32,
            xmax: xmax as i32,
            ymax: ymax as i32,
            pixels: flat,
        });
    }
}
