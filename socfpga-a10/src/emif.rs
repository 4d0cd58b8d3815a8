//! EMIF sequencer communication registers.
//!
//! `core2seq` is written by the HPS and read by the EMIF sequencer, `seq2core` is written by the
//! sequencer. Bit 7 of both registers implements the OCT calibration handshake: the HPS raises
//! `core2seq[7]` (OCT done) and the sequencer answers with `seq2core[7]` (OCT request).
use core::mem::offset_of;

pub const EMIF_HANDSHAKE_BASE_ADDR: usize = 0xFFD0_5078;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct Core2Seq {
    #[bit(7, rw)]
    oct_done: bool,
}

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct Seq2Core {
    #[bit(7, r)]
    oct_request: bool,
}

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct EmifHandshake {
    core2seq: Core2Seq,
    #[mmio(PureRead)]
    seq2core: Seq2Core,
}

static_assertions::const_assert_eq!(core::mem::size_of::<EmifHandshake>(), 0x8);

pub const CORE2SEQ_ADDR: usize = EMIF_HANDSHAKE_BASE_ADDR + offset_of!(EmifHandshake, core2seq);
pub const SEQ2CORE_ADDR: usize = EMIF_HANDSHAKE_BASE_ADDR + offset_of!(EmifHandshake, seq2core);

impl EmifHandshake {
    /// Create a new MMIO instance at address [EMIF_HANDSHAKE_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    pub const unsafe fn new_mmio_fixed() -> MmioEmifHandshake<'static> {
        unsafe { Self::new_mmio_at(EMIF_HANDSHAKE_BASE_ADDR) }
    }
}
