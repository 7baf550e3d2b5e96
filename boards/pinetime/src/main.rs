#![no_std]
#![no_main]

mod bluetooth;
mod config;
mod display;

// Panic handler and debugging
use defmt::unwrap;

use defmt_rtt as _;
use panic_probe as _;

// Device
use embassy_executor::Spawner;
use embassy_nrf::{
    bind_interrupts,
    gpio::{Level, Output, OutputDrive, Pin},
    peripherals::SPI2,
    spim,
};
use embassy_sync::{blocking_mutex::raw::ThreadModeRawMutex, channel::Channel, signal::Signal};
use embassy_time::{Duration, Ticker};
use nrf_softdevice::Softdevice;
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    SPIM2_SPIS2_SPI2 => spim::InterruptHandler<SPI2>;
});

// Crate
use bluetooth::{BleOutbox, Server};
use config::{SystemConfig, TIMEZONE};
use display::Display;

// Others
use weather_watchface::{
    BundledResources, DisplayCanvas, Event, EventLoop, EventQueue, LoopState, MinuteTicker,
    TimeManager, TimeReference, WeatherWatchface,
};

// Include current UTC epoch at compile time
include!(concat!(env!("OUT_DIR"), "/utc.rs"));

// Communication channels
pub static EVENTS: EventQueue<ThreadModeRawMutex> = Channel::new();
static FRAME: Signal<ThreadModeRawMutex, DisplayCanvas> = Signal::new();

static SERVER: StaticCell<Server> = StaticCell::new();

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task(pool_size = 1)]
async fn companion_link(sd: &'static Softdevice, server: &'static Server) {
    bluetooth::run(sd, server).await
}

/// Post a tick whenever the wall-clock minute changes
#[embassy_executor::task(pool_size = 1)]
async fn tick_timer(time: TimeManager) {
    let mut minutes = MinuteTicker::new();
    let mut tick = Ticker::every(Duration::from_secs(1));
    loop {
        if let Some(minute) = minutes.poll(time.get_time()) {
            EVENTS.send(Event::Tick(minute)).await;
        }

        // Re-schedule the timer interrupt in 1s
        tick.next().await;
    }
}

#[embassy_executor::task(pool_size = 1)]
async fn update_lcd(mut display: Display) {
    loop {
        let frame = FRAME.wait().await;
        if display.draw_frame(&frame).is_err() {
            defmt::error!("Frame transfer failed");
        }
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_nrf::init(SystemConfig::new());
    defmt::info!("Initializing");

    // Initialize Bluetooth
    let sd = Softdevice::enable(&SystemConfig::softdevice());
    let server = SERVER.init(unwrap!(Server::new(sd)));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));

    // Initialize SPI
    let spim = spim::Spim::new(p.SPI2, Irqs, p.P0_02, p.P0_04, p.P0_03, SystemConfig::spim());

    // Initialize LCD
    let display = unwrap!(Display::init(
        spim,
        Output::new(p.P0_25.degrade(), Level::Low, OutputDrive::Standard),
        Output::new(p.P0_18.degrade(), Level::Low, OutputDrive::Standard),
        Output::new(p.P0_26.degrade(), Level::Low, OutputDrive::Standard),
    ));

    // Backlight stays at the lowest level
    let _backlight = Output::new(p.P0_14, Level::Low, OutputDrive::Standard);

    // Initialize time
    let reference = TimeReference::from_timestamp(UTC_EPOCH, TIMEZONE).unwrap_or_default();
    let time = TimeManager::init(reference);

    defmt::info!("Initialization finished");

    // Schedule tasks
    unwrap!(spawner.spawn(update_lcd(display)));
    unwrap!(spawner.spawn(companion_link(sd, server)));
    unwrap!(spawner.spawn(tick_timer(time)));

    let watchface = WeatherWatchface::new(BundledResources, time, BleOutbox);
    let mut event_loop = EventLoop::new(&EVENTS, watchface);
    EVENTS.send(Event::WindowLoad).await;

    loop {
        match event_loop.next().await {
            Ok(LoopState::Running) => {
                let mut frame = DisplayCanvas::new();
                match event_loop.handler().render(&mut frame) {
                    Ok(()) => FRAME.signal(frame),
                    Err(e) => match e {},
                }
            }
            Ok(LoopState::Exited) => break,
            Err(e) => {
                defmt::error!("Watch face stopped: {}", e);
                break;
            }
        }
    }
}
