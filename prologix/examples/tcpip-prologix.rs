//! Configure a Prologix GPIB-ETHERNET controller and read from a function generator.

use prologix::{Controller, ControllerConfig, GpibTerm, TcpIpTransport};

fn main() {
    let transport = TcpIpTransport::simple("192.168.1.20").unwrap();
    let mut ctrl = Controller::try_new(transport, ControllerConfig::new(10)).unwrap();

    ctrl.set_gpib_termination(GpibTerm::AppendLf).unwrap();
    ctrl.set_read_timeout(1000).unwrap();
    println!("Read timeout: {} ms", ctrl.get_read_timeout().unwrap().value());

    println!("Instrument name: {}", ctrl.query("*IDN?").unwrap());
    ctrl.sendcmd("FREQ 1000").unwrap();
    println!("Frequency: {}", ctrl.query("FREQ?").unwrap());

    if ctrl.get_service_request().unwrap() {
        println!("Status byte: {:#010b}", ctrl.serial_poll().unwrap());
    }

    // Hand the front panel back to the user.
    ctrl.set_front_panel(true).unwrap();
}
