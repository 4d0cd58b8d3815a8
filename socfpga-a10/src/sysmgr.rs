//! System manager, only the silicon identification part is described here.
use core::mem::offset_of;

pub const SYSMGR_BASE_ADDR: usize = 0xFFD0_6000;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct SiliconId1 {
    #[bits(16..=31, r)]
    id: u16,
    #[bits(0..=15, r)]
    rev: u16,
}

#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct SystemManager {
    #[mmio(PureRead)]
    silicon_id1: SiliconId1,
    #[mmio(PureRead)]
    silicon_id2: u32,
    wddbg: u32,
    #[mmio(PureRead)]
    bootinfo: u32,
}

static_assertions::const_assert_eq!(core::mem::size_of::<SystemManager>(), 0x10);

pub const SILICON_ID1_ADDR: usize = SYSMGR_BASE_ADDR + offset_of!(SystemManager, silicon_id1);

impl SystemManager {
    /// Create a new system manager MMIO instance at address [SYSMGR_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    pub const unsafe fn new_mmio_fixed() -> MmioSystemManager<'static> {
        unsafe { Self::new_mmio_at(SYSMGR_BASE_ADDR) }
    }
}
