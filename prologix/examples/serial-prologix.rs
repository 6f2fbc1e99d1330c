//! Query an instrument through a Prologix GPIB-USB controller.

use prologix::{Controller, ControllerConfig, SerialTransport};

const PORT: &str = "/dev/ttyUSB0";
const GPIB_ADDRESS: u8 = 4;

fn main() {
    let transport = SerialTransport::simple(PORT).unwrap();
    let cfg = ControllerConfig {
        clear_on_init: true,
        ..ControllerConfig::new(GPIB_ADDRESS)
    };
    let mut ctrl = Controller::try_new(transport, cfg).unwrap();

    println!("Controller: {}", ctrl.get_version().unwrap());

    let addr = ctrl.get_address().unwrap();
    if addr.is_corrected() {
        println!("Controller reported a different address than configured.");
    }
    println!("GPIB address: {}", addr.value());

    println!("Instrument name: {}", ctrl.query("*IDN?").unwrap());
}
