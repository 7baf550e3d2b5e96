//! System configuration for the watch
//!
//! Everything board specific lives here: HAL clocks and interrupt
//! priorities, the display bus, the SoftDevice and the local timezone.

use core::mem;

use embassy_nrf::{
    config::{Config, Debug, HfclkSource, LfclkSource},
    interrupt::Priority,
    spim,
};
use nrf_softdevice::raw;

/// Local time offset from UTC in seconds
pub const TIMEZONE: i32 = 3_600;

/// Name used for advertising and the GAP device name
pub const DEVICE_NAME: &str = "PineTime";

/// The companion is the only central we talk to
const MAX_CONNECTIONS: u8 = 1;
/// Room for a full 244 byte inbox write in one ATT packet
const ATT_MTU: u16 = 256;

pub struct SystemConfig {}

impl SystemConfig {
    /// HAL configuration
    pub fn new() -> Config {
        let mut config = Config::default();

        config.hfclk_source = HfclkSource::ExternalXtal;
        config.lfclk_source = LfclkSource::ExternalXtal;

        // DC/DC regulator cuts runtime current
        config.dcdc.reg1 = true;

        // 0, 1 and 4 belong to the SoftDevice
        config.gpiote_interrupt_priority = Priority::P2;
        config.time_interrupt_priority = Priority::P2;

        config.debug = Debug::Allowed;

        config
    }

    /// SPI bus of the ST7789
    pub fn spim() -> spim::Config {
        let mut config = spim::Config::default();
        // 8MHz is the nRF52832 maximum, anything slower makes frame transfers crawl
        config.frequency = spim::Frequency::M8;
        // The panel only answers in mode 3
        config.mode = spim::MODE_3;
        config
    }

    /// SoftDevice setup for a single peripheral connection
    pub fn softdevice() -> nrf_softdevice::Config {
        nrf_softdevice::Config {
            clock: Some(raw::nrf_clock_lf_cfg_t {
                source: raw::NRF_CLOCK_LF_SRC_RC as u8,
                rc_ctiv: 16,
                rc_temp_ctiv: 2,
                accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
            }),
            conn_gap: Some(raw::ble_gap_conn_cfg_t {
                conn_count: MAX_CONNECTIONS,
                event_length: 24,
            }),
            conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: ATT_MTU }),
            gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
                attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
            }),
            gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
                adv_set_count: 1,
                periph_role_count: MAX_CONNECTIONS,
                central_role_count: 0,
                central_sec_count: 0,
                _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
            }),
            gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
                p_value: DEVICE_NAME.as_ptr() as _,
                current_len: DEVICE_NAME.len() as u16,
                max_len: DEVICE_NAME.len() as u16,
                write_perm: unsafe { mem::zeroed() },
                _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                    raw::BLE_GATTS_VLOC_STACK as u8,
                ),
            }),
            ..Default::default()
        }
    }
}
