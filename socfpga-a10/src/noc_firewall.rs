//! NoC DDR firewalls.
//!
//! Two firewall blocks guard the SDRAM: one for the MPU and the three FPGA-to-SDRAM ports and one
//! for the L3 interconnect masters. Each region is described by a single address register holding
//! the base in the lower and the limit in the upper half word. A region only takes effect when its
//! enable bit is set.
use core::mem::offset_of;

pub const FIREWALL_MPU_FPGA_BASE_ADDR: usize = 0xFFD1_3200;
pub const FIREWALL_L3_BASE_ADDR: usize = 0xFFD1_3400;

pub const MPU_REGIONS: usize = 4;
pub const FPGA2SDRAM_PORTS: usize = 3;
pub const FPGA2SDRAM_REGIONS: usize = 4;
pub const L3_REGIONS: usize = 8;

#[bitbybit::bitfield(u32, default = 0x0, debug)]
pub struct RegionAddr {
    #[bits(16..=31, rw)]
    limit: u16,
    #[bits(0..=15, rw)]
    base: u16,
}

/// Firewall for the MPU and FPGA-to-SDRAM masters.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct FirewallMpuFpga {
    enable: u32,
    #[mmio(Write)]
    enable_set: u32,
    #[mmio(Write)]
    enable_clear: u32,
    _reserved0: u32,
    mpu_region_addr: [RegionAddr; MPU_REGIONS],
    /// Grouped by port, four regions per port.
    fpga2sdram_region_addr: [RegionAddr; FPGA2SDRAM_PORTS * FPGA2SDRAM_REGIONS],
}

static_assertions::const_assert_eq!(core::mem::size_of::<FirewallMpuFpga>(), 0x50);

/// Firewall for the L3 interconnect masters.
#[derive(derive_mmio::Mmio)]
#[repr(C)]
pub struct FirewallL3 {
    enable: u32,
    #[mmio(Write)]
    enable_set: u32,
    #[mmio(Write)]
    enable_clear: u32,
    hps_region_addr: [RegionAddr; L3_REGIONS],
}

static_assertions::const_assert_eq!(core::mem::size_of::<FirewallL3>(), 0x2C);

pub const MPU_FPGA_ENABLE_ADDR: usize =
    FIREWALL_MPU_FPGA_BASE_ADDR + offset_of!(FirewallMpuFpga, enable);
pub const L3_ENABLE_ADDR: usize = FIREWALL_L3_BASE_ADDR + offset_of!(FirewallL3, enable);

/// Address register of MPU region `n`.
pub const fn mpu_region_addr(n: usize) -> usize {
    assert!(n < MPU_REGIONS);
    FIREWALL_MPU_FPGA_BASE_ADDR + offset_of!(FirewallMpuFpga, mpu_region_addr) + n * 4
}

/// Enable mask of MPU region `n` inside the MPU/FPGA enable register.
pub const fn mpu_region_enable(n: usize) -> u32 {
    assert!(n < MPU_REGIONS);
    1 << n
}

/// Address register of region `region` of FPGA-to-SDRAM port `port`.
pub const fn fpga2sdram_region_addr(port: usize, region: usize) -> usize {
    assert!(port < FPGA2SDRAM_PORTS && region < FPGA2SDRAM_REGIONS);
    FIREWALL_MPU_FPGA_BASE_ADDR
        + offset_of!(FirewallMpuFpga, fpga2sdram_region_addr)
        + (port * FPGA2SDRAM_REGIONS + region) * 4
}

/// Enable mask of region `region` of FPGA-to-SDRAM port `port` inside the MPU/FPGA enable
/// register.
pub const fn fpga2sdram_region_enable(port: usize, region: usize) -> u32 {
    assert!(port < FPGA2SDRAM_PORTS && region < FPGA2SDRAM_REGIONS);
    1 << (MPU_REGIONS + port * FPGA2SDRAM_REGIONS + region)
}

/// Address register of L3 (HPS) region `n`.
pub const fn l3_region_addr(n: usize) -> usize {
    assert!(n < L3_REGIONS);
    FIREWALL_L3_BASE_ADDR + offset_of!(FirewallL3, hps_region_addr) + n * 4
}

/// Enable mask of L3 region `n` inside the L3 enable register.
pub const fn l3_region_enable(n: usize) -> u32 {
    assert!(n < L3_REGIONS);
    1 << n
}

impl FirewallMpuFpga {
    /// Create a new MMIO instance at address [FIREWALL_MPU_FPGA_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    pub const unsafe fn new_mmio_fixed() -> MmioFirewallMpuFpga<'static> {
        unsafe { Self::new_mmio_at(FIREWALL_MPU_FPGA_BASE_ADDR) }
    }
}

impl FirewallL3 {
    /// Create a new MMIO instance at address [FIREWALL_L3_BASE_ADDR].
    ///
    /// # Safety
    ///
    /// This API can be used to potentially create a driver to the same peripheral structure
    /// from multiple threads. The user must ensure that concurrent accesses are safe and do not
    /// interfere with each other.
    pub const unsafe fn new_mmio_fixed() -> MmioFirewallL3<'static> {
        unsafe { Self::new_mmio_at(FIREWALL_L3_BASE_ADDR) }
    }
}
