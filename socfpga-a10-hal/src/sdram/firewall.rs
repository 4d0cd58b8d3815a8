//! NoC DDR firewall configuration.
//!
//! The regions a board wants to open are taken from the board configuration. Every region which
//! is not requested stays closed.
use embedded_hal::delay::DelayNs;
use socfpga_a10::noc_firewall::{
    FPGA2SDRAM_PORTS, FPGA2SDRAM_REGIONS, L3_ENABLE_ADDR, L3_REGIONS, MPU_FPGA_ENABLE_ADDR,
    MPU_REGIONS, RegionAddr, fpga2sdram_region_addr, fpga2sdram_region_enable, l3_region_addr,
    l3_region_enable, mpu_region_addr, mpu_region_enable,
};

use crate::regs::{RegisterBus, RegisterPort, Watchdog};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FirewallSetupError {
    #[error("no child configuration below the firewall node")]
    NoChildConfig,
    #[error("no compatible firewall node in the board configuration")]
    NoCompatibleNode,
}

impl FirewallSetupError {
    pub const fn code(&self) -> i32 {
        match self {
            FirewallSetupError::NoChildConfig => 1,
            FirewallSetupError::NoCompatibleNode => 2,
        }
    }
}

/// Lookup of firewall region ranges by region name.
pub trait FirewallRegions {
    /// Returns the `[start, end]` pair configured for the region, if any.
    fn region(&self, name: &str) -> Option<[u32; 2]>;
}

/// Source of the board specific firewall configuration.
pub trait BoardConfig {
    type Regions: FirewallRegions + ?Sized;

    /// Returns the region lookup of the NoC firewall configuration node.
    fn noc_firewall(&self) -> Result<&Self::Regions, FirewallSetupError>;
}

/// Named firewall region range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirewallRange {
    pub name: &'static str,
    pub start: u32,
    pub end: u32,
}

impl FirewallRange {
    pub const fn new(name: &'static str, start: u32, end: u32) -> Self {
        Self { name, start, end }
    }
}

impl FirewallRegions for [FirewallRange] {
    fn region(&self, name: &str) -> Option<[u32; 2]> {
        self.iter()
            .find(|range| range.name == name)
            .map(|range| [range.start, range.end])
    }
}

/// Board configuration known at compile time.
#[derive(Debug, Clone, Copy)]
pub enum StaticBoardConfig<'a> {
    /// The board has no NoC firewall node.
    NoNocNode,
    /// The NoC firewall node exists but has no child configuration.
    NoChildNode,
    Regions(&'a [FirewallRange]),
}

impl BoardConfig for StaticBoardConfig<'_> {
    type Regions = [FirewallRange];

    fn noc_firewall(&self) -> Result<&[FirewallRange], FirewallSetupError> {
        match *self {
            StaticBoardConfig::NoNocNode => Err(FirewallSetupError::NoCompatibleNode),
            StaticBoardConfig::NoChildNode => Err(FirewallSetupError::NoChildConfig),
            StaticBoardConfig::Regions(regions) => Ok(regions),
        }
    }
}

/// One firewall region which can be opened by the board configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirewallEntry {
    pub name: &'static str,
    /// Address of the region address register.
    pub cfg_addr: usize,
    /// Address of the enable register of the firewall block.
    pub en_addr: usize,
    pub en_mask: u32,
}

impl FirewallEntry {
    const fn mpu(name: &'static str, n: usize) -> Self {
        Self {
            name,
            cfg_addr: mpu_region_addr(n),
            en_addr: MPU_FPGA_ENABLE_ADDR,
            en_mask: mpu_region_enable(n),
        }
    }

    const fn l3(name: &'static str, n: usize) -> Self {
        Self {
            name,
            cfg_addr: l3_region_addr(n),
            en_addr: L3_ENABLE_ADDR,
            en_mask: l3_region_enable(n),
        }
    }

    const fn fpga2sdram(name: &'static str, port: usize, region: usize) -> Self {
        Self {
            name,
            cfg_addr: fpga2sdram_region_addr(port, region),
            en_addr: MPU_FPGA_ENABLE_ADDR,
            en_mask: fpga2sdram_region_enable(port, region),
        }
    }
}

pub const FIREWALL_ENTRIES: usize =
    MPU_REGIONS + L3_REGIONS + FPGA2SDRAM_PORTS * FPGA2SDRAM_REGIONS;

pub static FIREWALL_TABLE: [FirewallEntry; FIREWALL_ENTRIES] = [
    FirewallEntry::mpu("mpu0", 0),
    FirewallEntry::mpu("mpu1", 1),
    FirewallEntry::mpu("mpu2", 2),
    FirewallEntry::mpu("mpu3", 3),
    FirewallEntry::l3("l3-0", 0),
    FirewallEntry::l3("l3-1", 1),
    FirewallEntry::l3("l3-2", 2),
    FirewallEntry::l3("l3-3", 3),
    FirewallEntry::l3("l3-4", 4),
    FirewallEntry::l3("l3-5", 5),
    FirewallEntry::l3("l3-6", 6),
    FirewallEntry::l3("l3-7", 7),
    FirewallEntry::fpga2sdram("fpga2sdram0-0", 0, 0),
    FirewallEntry::fpga2sdram("fpga2sdram0-1", 0, 1),
    FirewallEntry::fpga2sdram("fpga2sdram0-2", 0, 2),
    FirewallEntry::fpga2sdram("fpga2sdram0-3", 0, 3),
    FirewallEntry::fpga2sdram("fpga2sdram1-0", 1, 0),
    FirewallEntry::fpga2sdram("fpga2sdram1-1", 1, 1),
    FirewallEntry::fpga2sdram("fpga2sdram1-2", 1, 2),
    FirewallEntry::fpga2sdram("fpga2sdram1-3", 1, 3),
    FirewallEntry::fpga2sdram("fpga2sdram2-0", 2, 0),
    FirewallEntry::fpga2sdram("fpga2sdram2-1", 2, 1),
    FirewallEntry::fpga2sdram("fpga2sdram2-2", 2, 2),
    FirewallEntry::fpga2sdram("fpga2sdram2-3", 2, 3),
];

/// Region address register value. Base and limit are truncated to the 16 bit register fields.
#[inline]
pub fn region_addr(start: u32, end: u32) -> RegionAddr {
    RegionAddr::new_with_raw_value(0)
        .with_base(start as u16)
        .with_limit(end as u16)
}

/// Closes all SDRAM firewall regions and opens the regions requested by the board.
///
/// Returns the number of opened regions. Both errors leave the firewall registers untouched and
/// are not fatal for the boot.
pub fn setup_firewall<P: RegisterPort, D: DelayNs, W: Watchdog, B: BoardConfig + ?Sized>(
    bus: &mut RegisterBus<P, D, W>,
    board: &B,
) -> Result<usize, FirewallSetupError> {
    let regions = board.noc_firewall()?;

    bus.write(MPU_FPGA_ENABLE_ADDR, 0);
    bus.write(L3_ENABLE_ADDR, 0);

    let mut opened = 0;
    for entry in FIREWALL_TABLE.iter() {
        let Some([start, end]) = regions.region(entry.name) else {
            continue;
        };
        log::debug!("firewall region {}: {start:#010x}..{end:#010x}", entry.name);
        bus.write(entry.cfg_addr, region_addr(start, end).raw_value());
        bus.set_bits(entry.en_addr, entry.en_mask);
        opened += 1;
    }
    Ok(opened)
}
