//! Companion link over BLE
//!
//! The companion writes weather reports into the inbox characteristic and
//! receives refresh requests as notifications on the outbox characteristic.

// BLE
use nrf_softdevice::{
    self,
    ble::{
        advertisement_builder::{
            Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
        },
        gatt_server, peripheral, Connection,
    },
    Softdevice,
};

// Others
use embassy_futures::select::{select, Either};
use embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, channel::Channel};
use weather_watchface::{
    system::message::{InboxPayload, OUTBOX_SIZE},
    DeliveryError, Event, Outbox,
};

use crate::{config::DEVICE_NAME, EVENTS};

/// Largest value a single ATT write can carry with the configured MTU
const ATT_VALUE_LEN: usize = 244;

pub type OutboxMessage = heapless::Vec<u8, OUTBOX_SIZE>;

/// Requests waiting to be notified to the companion
pub static OUTBOX: Channel<ThreadModeRawMutex, OutboxMessage, 1> = Channel::new();

pub static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .full_name(DEVICE_NAME)
    .build();

pub static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_128(
        ServiceList::Complete,
        &[0x8e, 0x2b, 0x59, 0x1d, 0x6a, 0x4c, 0x4e, 0x97, 0x9c, 0x1e, 0x3b, 0x5f, 0x01, 0x00, 0x00, 0x00],
    )
    .build();

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub companion: CompanionService,
}

#[nrf_softdevice::gatt_service(uuid = "00000001-5f3b-1e9c-974e-4c6a1d592b8e")]
pub struct CompanionService {
    #[characteristic(uuid = "00000002-5f3b-1e9c-974e-4c6a1d592b8e", write)]
    pub inbox: heapless::Vec<u8, ATT_VALUE_LEN>,
    #[characteristic(uuid = "00000003-5f3b-1e9c-974e-4c6a1d592b8e", read, notify)]
    pub outbox: OutboxMessage,
}

/// Queues outgoing messages for the BLE task
pub struct BleOutbox;

impl Outbox for BleOutbox {
    fn send(&mut self, payload: &[u8]) -> Result<(), DeliveryError> {
        let message = OutboxMessage::from_slice(payload).map_err(|_| DeliveryError::BufferOverflow)?;
        OUTBOX.try_send(message).map_err(|_| DeliveryError::Busy)
    }
}

fn post(event: Event) {
    if EVENTS.try_send(event).is_err() {
        defmt::warn!("Event queue full, event dropped");
    }
}

fn inbox_written(value: &[u8]) {
    match InboxPayload::from_slice(value) {
        Ok(payload) => post(Event::InboxReceived(payload)),
        Err(_) => post(Event::InboxDropped(DeliveryError::BufferOverflow)),
    }
}

/// Forward queued requests while `conn` is up
async fn notify_outbox(server: &Server, conn: &Connection) {
    loop {
        let message = OUTBOX.receive().await;
        match server.companion.outbox_notify(conn, &message) {
            Ok(()) => post(Event::OutboxSent),
            Err(_) => post(Event::OutboxFailed(DeliveryError::NotConnected)),
        }
    }
}

/// Advertise, serve the companion while connected, repeat
pub async fn run(sd: &'static Softdevice, server: &'static Server) -> ! {
    let config = peripheral::Config::default();
    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };
        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                defmt::error!("Advertising failed: {:?}", e);
                continue;
            }
        };
        defmt::info!("Companion connected");

        let served = gatt_server::run(&conn, server, |e| match e {
            ServerEvent::Companion(CompanionServiceEvent::InboxWrite(value)) => {
                inbox_written(&value)
            }
            ServerEvent::Companion(CompanionServiceEvent::OutboxCccdWrite { notifications }) => {
                defmt::info!("Outbox notifications: {}", notifications);
            }
        });

        match select(served, notify_outbox(server, &conn)).await {
            Either::First(e) => defmt::info!("Companion disconnected: {:?}", e),
            Either::Second(_) => {}
        }
    }
}
