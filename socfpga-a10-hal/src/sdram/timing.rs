//! NoC DDR scheduler configuration derived from the EMIF configuration.
//!
//! The EMIF calibration leaves the memory parameters in the IO48 memory mapped registers. The
//! NoC DDR scheduler does not pick these up by itself, so its address mapping and timing registers
//! are derived here once after calibration.
//!
//! All values are integer arithmetic on the raw register fields. Results which do not fit into
//! the destination field are truncated to the field width.
use arbitrary_int::{u2, u3, u4, u5, u6};
use embedded_hal::delay::DelayNs;
use socfpga_a10::ecc_hmc::{
    DDRIOCTRL_ADDR, DdrIoControl, ECCCTRL_ADDR, ECCCTRL2_ADDR, EccControl, EccControl2,
};
use socfpga_a10::io48_mmr::*;
use socfpga_a10::noc_scheduler::*;

use crate::regs::{RegisterBus, RegisterPort, Watchdog};

/// Number of banks of a device involved in the FAW period. Only four bank devices are supported.
pub const ACTIVATE_FAW_BANK: u2 = u2::new(1);

/// Write recovery time tWR in memory clock cycles. tWR is 15 ns, and one memory clock cycle is
/// close to 1 ns at 1066 MHz.
pub const WRITE_RECOVERY_CYCLES: u32 = 15;

/// Packs the memory geometry into the key format of [DDR_CONFIGS].
pub const fn ddr_config_key(addr_order: u32, bank_bits: u32, col_bits: u32, row_bits: u32) -> u32 {
    (addr_order << 24) | (bank_bits << 16) | (col_bits << 8) | row_bits
}

/// Address mappings supported by the NoC DDR scheduler, indexed by the value of the DDR
/// configuration register. Index 0 is a placeholder meaning "no match".
pub const DDR_CONFIGS: [u32; 29] = [
    0,
    // Chip - row - bank - column, all memory types.
    ddr_config_key(0, 3, 10, 12),
    ddr_config_key(0, 3, 10, 13),
    ddr_config_key(0, 3, 10, 14),
    ddr_config_key(0, 3, 10, 15),
    ddr_config_key(0, 3, 10, 16),
    ddr_config_key(0, 3, 10, 17),
    // LPDDR x16
    ddr_config_key(0, 3, 11, 14),
    ddr_config_key(0, 3, 11, 15),
    ddr_config_key(0, 3, 11, 16),
    ddr_config_key(0, 3, 12, 15),
    // DDR4 only
    ddr_config_key(0, 4, 10, 14),
    ddr_config_key(0, 4, 10, 15),
    ddr_config_key(0, 4, 10, 16),
    ddr_config_key(0, 4, 10, 17),
    // Chip - bank - row - column
    ddr_config_key(1, 3, 10, 12),
    ddr_config_key(1, 3, 10, 13),
    ddr_config_key(1, 3, 10, 14),
    ddr_config_key(1, 3, 10, 15),
    ddr_config_key(1, 3, 10, 16),
    ddr_config_key(1, 3, 10, 17),
    ddr_config_key(1, 3, 11, 14),
    ddr_config_key(1, 3, 11, 15),
    ddr_config_key(1, 3, 11, 16),
    ddr_config_key(1, 3, 12, 15),
    // DDR4 only
    ddr_config_key(1, 4, 10, 14),
    ddr_config_key(1, 4, 10, 15),
    ddr_config_key(1, 4, 10, 16),
    ddr_config_key(1, 4, 10, 17),
];

/// Looks up the DDR configuration index of a packed geometry key.
///
/// Returns 0 for unknown geometries, in which case the scheduler default must be kept.
pub fn match_ddr_config(key: u32) -> u8 {
    DDR_CONFIGS
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, config)| **config == key)
        .map(|(idx, _)| idx as u8)
        .unwrap_or(0)
}

/// Read-to-miss time in controller clock cycles: tRTP + tRP + tRCD - BL/4.
pub const fn rd_to_miss(
    rd_to_pch: u32,
    pch_to_valid: u32,
    act_to_rdwr: u32,
    burst_len: u32,
) -> u32 {
    (rd_to_pch + pch_to_valid + act_to_rdwr).wrapping_sub(burst_len >> 2)
}

/// Write-to-miss time in controller clock cycles.
///
/// WRTOMISS = WL + tWR + tRP + tRCD with WL = RL + BL/2 + 2 - rd-to-wr. The first part is in
/// memory clock cycles and is halved to get controller clock cycles:
/// `((RL + 2 + tWR + BL/2) >> 1) - rd-to-wr + tRCD + tRP`.
pub const fn wr_to_miss(
    read_latency: u32,
    burst_len: u32,
    rd_to_wr: u32,
    act_to_rdwr: u32,
    pch_to_valid: u32,
) -> u32 {
    ((read_latency + 2 + WRITE_RECOVERY_CYCLES + (burst_len >> 1)) >> 1)
        .wrapping_sub(rd_to_wr)
        .wrapping_add(act_to_rdwr)
        .wrapping_add(pch_to_valid)
}

/// Raw EMIF configuration fields which feed the scheduler configuration.
#[derive(Debug, Clone, Copy)]
pub struct ControllerFields {
    pub ctrlcfg0: CtrlCfg0,
    pub ctrlcfg1: CtrlCfg1,
    pub dramtiming0: DramTiming0,
    pub caltiming0: CalTiming0,
    pub caltiming1: CalTiming1,
    pub caltiming2: CalTiming2,
    pub caltiming3: CalTiming3,
    pub caltiming4: CalTiming4,
    pub caltiming9: CalTiming9,
    pub dramaddrw: DramAddrWidth,
    pub ddrioctrl: DdrIoControl,
}

impl ControllerFields {
    pub fn read<P: RegisterPort, D: DelayNs, W: Watchdog>(bus: &mut RegisterBus<P, D, W>) -> Self {
        Self {
            ctrlcfg0: CtrlCfg0::new_with_raw_value(bus.read(CTRLCFG0_ADDR)),
            ctrlcfg1: CtrlCfg1::new_with_raw_value(bus.read(CTRLCFG1_ADDR)),
            dramtiming0: DramTiming0::new_with_raw_value(bus.read(DRAMTIMING0_ADDR)),
            caltiming0: CalTiming0::new_with_raw_value(bus.read(CALTIMING0_ADDR)),
            caltiming1: CalTiming1::new_with_raw_value(bus.read(CALTIMING1_ADDR)),
            caltiming2: CalTiming2::new_with_raw_value(bus.read(CALTIMING2_ADDR)),
            caltiming3: CalTiming3::new_with_raw_value(bus.read(CALTIMING3_ADDR)),
            caltiming4: CalTiming4::new_with_raw_value(bus.read(CALTIMING4_ADDR)),
            caltiming9: CalTiming9::new_with_raw_value(bus.read(CALTIMING9_ADDR)),
            dramaddrw: DramAddrWidth::new_with_raw_value(bus.read(DRAMADDRW_ADDR)),
            ddrioctrl: DdrIoControl::new_with_raw_value(bus.read(DDRIOCTRL_ADDR)),
        }
    }

    /// Packed geometry key, the bank group bits count as bank bits.
    pub fn ddr_config_key(&self) -> u32 {
        let addrw = self.dramaddrw;
        ddr_config_key(
            u32::from(self.ctrlcfg1.addr_order().value()),
            u32::from(addrw.bank_addr_width().value())
                + u32::from(addrw.bank_group_addr_width().value()),
            u32::from(addrw.col_addr_width().value()),
            u32::from(addrw.row_addr_width().value()),
        )
    }

    #[inline]
    fn burst_len(&self) -> u32 {
        u32::from(self.ctrlcfg0.ctrl_burst_len().value())
    }

    #[inline]
    fn read_latency(&self) -> u32 {
        u32::from(self.dramtiming0.read_latency().value())
    }
}

#[inline]
const fn field_u2(value: u32) -> u2 {
    u2::new((value & 0b11) as u8)
}

#[inline]
const fn field_u3(value: u32) -> u3 {
    u3::new((value & 0b111) as u8)
}

#[inline]
const fn field_u4(value: u32) -> u4 {
    u4::new((value & 0xF) as u8)
}

#[inline]
const fn field_u5(value: u32) -> u5 {
    u5::new((value & 0x1F) as u8)
}

#[inline]
const fn field_u6(value: u32) -> u6 {
    u6::new((value & 0x3F) as u8)
}

/// Complete NoC DDR scheduler configuration.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerTiming {
    /// 0 if the geometry is not supported, the register is left untouched then.
    pub ddr_conf: u8,
    pub ddr_timing: DdrTiming,
    pub ddr_mode: DdrMode,
    pub read_latency: ReadLatency,
    pub activate: Activate,
    pub dev_to_dev: DevToDev,
}

impl SchedulerTiming {
    pub fn derive(fields: &ControllerFields) -> Self {
        let burst_len = fields.burst_len();
        let act_to_rdwr = u32::from(fields.caltiming0.act_to_rdwr().value());
        let pch_to_valid = u32::from(fields.caltiming4.pch_to_valid().value());
        let rd_to_wr = u32::from(fields.caltiming1.rd_to_wr().value());
        let ddrioctrl = fields.ddrioctrl.raw_value();

        let ddr_timing = DdrTiming::new_with_raw_value(0)
            .with_act_to_act(fields.caltiming0.act_to_act())
            .with_rd_to_miss(field_u6(rd_to_miss(
                u32::from(fields.caltiming2.rd_to_pch().value()),
                pch_to_valid,
                act_to_rdwr,
                burst_len,
            )))
            .with_wr_to_miss(field_u6(wr_to_miss(
                fields.read_latency(),
                burst_len,
                rd_to_wr,
                act_to_rdwr,
                pch_to_valid,
            )))
            .with_burst_len(field_u3(burst_len >> 2))
            .with_rd_to_wr(field_u5(rd_to_wr))
            .with_wr_to_rd(field_u5(u32::from(fields.caltiming3.wr_to_rd().value())))
            .with_bw_ratio(ddrioctrl == 1);

        let activate = Activate::new_with_raw_value(0)
            .with_rrd(field_u4(u32::from(
                fields.caltiming0.act_to_act_diff_bg().value(),
            )))
            .with_faw(field_u6(u32::from(fields.caltiming9.four_act_to_act())))
            .with_faw_bank(ACTIVATE_FAW_BANK);

        let dev_to_dev = DevToDev::new_with_raw_value(0)
            .with_bus_rd_to_rd(field_u2(u32::from(
                fields.caltiming1.rd_to_rd_diff_chip().value(),
            )))
            .with_bus_rd_to_wr(field_u2(u32::from(
                fields.caltiming1.rd_to_wr_diff_chip().value(),
            )))
            .with_bus_wr_to_rd(field_u2(u32::from(
                fields.caltiming3.wr_to_rd_diff_chip().value(),
            )));

        Self {
            ddr_conf: match_ddr_config(fields.ddr_config_key()),
            ddr_timing,
            ddr_mode: DdrMode::new_with_raw_value(0).with_bw_ratio_extended(ddrioctrl == 0),
            read_latency: ReadLatency::new_with_raw_value(0)
                .with_read_latency((fields.read_latency() >> 1) as u8),
            activate,
            dev_to_dev,
        }
    }

    pub fn write<P: RegisterPort, D: DelayNs, W: Watchdog>(&self, bus: &mut RegisterBus<P, D, W>) {
        if self.ddr_conf != 0 {
            let ddr_conf =
                DdrConf::new_with_raw_value(0).with_ddr_conf(field_u5(u32::from(self.ddr_conf)));
            bus.write(DDRCONF_ADDR, ddr_conf.raw_value());
        } else {
            log::warn!("unsupported DDR geometry, keeping scheduler address mapping");
        }
        bus.write(DDRTIMING_ADDR, self.ddr_timing.raw_value());
        bus.write(DDRMODE_ADDR, self.ddr_mode.raw_value());
        bus.write(READ_LATENCY_ADDR, self.read_latency.raw_value());
        bus.write(ACTIVATE_ADDR, self.activate.raw_value());
        bus.write(DEVTODEV_ADDR, self.dev_to_dev.raw_value());
    }
}

/// Configures the DDR IO size from the data width reported by the EMIF calibration code.
///
/// EMIF IP versions which do not report a version number leave the IO size untouched.
pub fn configure_io_size<P: RegisterPort, D: DelayNs, W: Watchdog>(
    bus: &mut RegisterBus<P, D, W>,
) {
    let version = NiosReserve1::new_with_raw_value(bus.read(NIOSRESERVE1_ADDR)).version();
    if version.value() == 0 {
        return;
    }
    let data_width = NiosReserve0::new_with_raw_value(bus.read(NIOSRESERVE0_ADDR)).data_width();
    bus.write(DDRIOCTRL_ADDR, u32::from(data_width >> 5));
}

/// Enables or disables ECC in the HMC adapter.
pub fn configure_ecc<P: RegisterPort, D: DelayNs, W: Watchdog>(
    bus: &mut RegisterBus<P, D, W>,
    enable: bool,
) {
    let counter_resets = EccControl::new_with_raw_value(0)
        .with_awb_cnt_rst(true)
        .with_cnt_rst(true)
        .raw_value();
    let ecc_en = EccControl::new_with_raw_value(0).with_ecc_en(true).raw_value();
    let ctrl2 = EccControl2::new_with_raw_value(0)
        .with_rmw_en(true)
        .with_awb_en(true)
        .raw_value();
    if enable {
        bus.set_bits(ECCCTRL_ADDR, counter_resets | ecc_en);
        bus.clear_bits(ECCCTRL_ADDR, counter_resets);
        bus.set_bits(ECCCTRL2_ADDR, ctrl2);
    } else {
        bus.clear_bits(ECCCTRL_ADDR, counter_resets | ecc_en);
        bus.clear_bits(ECCCTRL2_ADDR, ctrl2);
    }
}

/// Initializes the HMC adapter and the NoC DDR scheduler after a successful calibration.
pub fn init_controller<P: RegisterPort, D: DelayNs, W: Watchdog>(
    bus: &mut RegisterBus<P, D, W>,
) -> SchedulerTiming {
    configure_io_size(bus);
    let fields = ControllerFields::read(bus);
    configure_ecc(bus, fields.ctrlcfg1.ctrl_enable_ecc());
    let timing = SchedulerTiming::derive(&fields);
    log::debug!("NoC DDR scheduler configuration: {timing:?}");
    timing.write(bus);
    timing
}
