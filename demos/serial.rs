use std::{env, error::Error};

use ea_ps2000::{
    link::{self, LinkConfig, SerialLink},
    psu::Ps2000,
    relay::{RelayBoard, RelayChannel},
};
use inquire::Select;
use serialport::{SerialPortInfo, SerialPortType};

// Configuration constants - adjust these for your setup
const OUTPUT_VOLTAGE: f32 = 5.5;
const CURRENT_LIMIT: f32 = 0.1;
const STABILIZATION_DELAY_MS: u64 = 1000;
// Set to a port name to also switch a load through the relay board.
const RELAY_PORT: Option<&str> = None;

fn is_ps2000(info: &SerialPortInfo) -> bool {
    match &info.port_type {
        SerialPortType::UsbPort(usb) => usb
            .product
            .as_deref()
            .is_some_and(|product| product.starts_with("PS 2000")),
        _ => false,
    }
}

fn select_port() -> Result<String, Box<dyn Error>> {
    let mut ports = serialport::available_ports()?;
    if ports.is_empty() {
        return Err("No serial ports found!".into());
    }
    // Power supplies first
    ports.sort_by_key(|info| !is_ps2000(info));

    let port_names: Vec<String> = ports.into_iter().map(|p| p.port_name).collect();
    Ok(Select::new("Select a serial port:", port_names).prompt()?)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    // Get serial port from command line arg or interactive selection
    let port_name = match env::args().nth(1) {
        Some(port_name) => port_name,
        None => select_port()?,
    };
    println!("Using port: {}", port_name);

    let link = SerialLink::open(&port_name, &LinkConfig::default())?;
    let mut psu = Ps2000::open(link)?;

    println!("Device type:   {}", psu.get_type()?);
    println!("Manufacturer:  {}", psu.get_manufacturer()?);
    println!("Serial number: {}", psu.get_serial()?);
    println!("Article:       {}", psu.get_article()?);
    println!("Software:      {}", psu.get_version()?);
    let ratings = psu.nominal_ratings();
    println!(
        "Nominal:       {}V / {}A / {}W",
        ratings.u_nom,
        ratings.i_nom,
        psu.get_nominal_power()?
    );
    println!("Status: {:#?}", psu.get_actual()?);

    let mut relays = match RELAY_PORT {
        Some(path) => Some(link::open_relay_board(path)?),
        None => None,
    };
    let load = relays
        .as_mut()
        .and_then(|board: &mut RelayBoard<SerialLink>| {
            board.claim(RelayChannel::Relay1).then_some(RelayChannel::Relay1)
        });

    // Take control and program the output
    psu.set_remote(true)?;
    psu.set_voltage(OUTPUT_VOLTAGE)?;
    println!("Set output voltage to {}V", OUTPUT_VOLTAGE);
    psu.set_current(CURRENT_LIMIT)?;
    println!("Set current limit to {}A", CURRENT_LIMIT);

    psu.set_output_on(true)?;
    println!("Output enabled");
    if let (Some(board), Some(channel)) = (relays.as_mut(), load) {
        board.switch(channel, true)?;
        println!("Load connected on relay {}", channel.number());
    }

    // Wait for output to stabilize
    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    let status = psu.get_actual()?;
    println!(
        "Measured: {:.3}V {:.3}A ({:?})",
        status.voltage, status.current, status.mode
    );
    if status.any_fault() {
        println!("Protection tripped: {:#?}", status);
    }

    if let (Some(board), Some(channel)) = (relays.as_mut(), load) {
        board.switch(channel, false)?;
        board.release(channel);
    }
    psu.set_output_off(true)?;
    psu.set_local(true)?;
    println!("Output disabled, back to local control");

    psu.close();
    Ok(())
}
