//! Protocol constants shared by the DistoX hardware generations

// Memory exchange opcodes
pub const OP_MEM_READ: u8 = 0x38; // 3-byte request, also the echoed opcode in every reply
pub const OP_MEM_WRITE: u8 = 0x39; // 7-byte request

// Single-byte commands (no reply)
pub const CMD_CAL_STOP: u8 = 0x30; // Leave calibration mode
pub const CMD_CAL_START: u8 = 0x31; // Enter calibration mode

/// Every memory reply is exactly this long
pub const REPLY_LEN: usize = 8;

/// Attempts per memory exchange before giving up
pub const MEM_RETRY_ATTEMPTS: u32 = 5;

// Calibration coefficient window: 13 words at 0x8010..0x8044
pub const ADDR_CAL_DATA: u16 = 0x8010;
pub const ADDR_CAL_DATA_END: u16 = 0x8044;

/// Linear calibration: 3x3 matrix + bias vector per sensor pair, 12 words
pub const CAL_LINEAR_LEN: usize = 48;

/// Hard cap on a calibration blob: the linear words plus one word of
/// nonlinear correction terms. Oversized input is truncated to this.
pub const CAL_MAX_LEN: usize = 52;

/// Oldest firmware able to store nonlinear coefficients (DistoX2 2.3)
pub const MIN_NONLINEAR_FW: u16 = 2003;

// Firmware version word, `b0 * 1000 + b1` on both generations
pub const ADDR_FW_VERSION: u16 = 0xE000;

// Status byte holding the calibration-mode flag
pub const ADDR_STATUS_DISTOX: u16 = 0x8000;
pub const ADDR_STATUS_DISTOX2: u16 = 0xC044;
pub const CAL_FLAG_DISTOX: u8 = 0x08;
pub const CAL_FLAG_DISTOX2: u8 = 0x20;

// Log write cursor: the DistoX stores a byte address, the DistoX2 a
// segment index
pub const ADDR_CURSOR_DISTOX: u16 = 0xC020;
pub const ADDR_CURSOR_DISTOX2: u16 = 0xE008;
