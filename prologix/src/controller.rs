//! The controller-in-charge session and its configuration commands.

use std::{
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use log::debug;

use crate::{
    ControllerConfig, ControllerError, GpibAddress, GpibTerm, Reply, Setting, Settings, Synced,
    Transport,
    command::mnemonic,
    engine::Session,
    settings::{check_primary_address, check_read_timeout, check_secondary_address, reconcile},
};

/// A session with a Prologix GPIB controller acting as controller-in-charge.
///
/// The controller forwards instrument commands to the instrument at the configured GPIB address
/// and keeps a local copy of its own configuration, see [`Settings`]. Setters only update that
/// copy once the command was written successfully. Getters query the controller and compare the
/// answer with the copy, see [`Synced`].
///
/// The transport and the cached settings sit behind one mutex that is held for a whole command or
/// query round trip. Cloning the controller is cheap and gives you another handle to the same
/// session, which you can send to another thread if the transport is [`Send`].
///
/// # Example
///
/// ```
/// use prologix::{Controller, ControllerConfig, LoopbackTransport};
///
/// let host2ctrl = vec![
///     "++savecfg 0", "++addr 5", "++mode 1", "++auto 0", "++eoi 1", "++eos 0",
///     "++read_tmo_ms 500", "++eot_char 10", "++eot_enable 1", "++savecfg 1",
///     "*IDN?", "++read eoi",
/// ];
/// let ctrl2host = vec!["ACME,Model 1,1234,1.0"];
/// let transport = LoopbackTransport::new(host2ctrl, ctrl2host);
///
/// let mut ctrl = Controller::try_new(transport, ControllerConfig::new(5)).unwrap();
/// assert_eq!(ctrl.query("*IDN?").unwrap(), "ACME,Model 1,1234,1.0");
/// ```
pub struct Controller<T: Transport> {
    session: Arc<Mutex<Session<T>>>,
}

impl<T: Transport> Controller<T> {
    /// Create a new controller session and write the initial configuration.
    ///
    /// The configuration is validated first, nothing is written if it is invalid. The controller
    /// is then configured with saving to EEPROM disabled, so that the initialization does not wear
    /// the EEPROM, and saving is enabled again at the end.
    ///
    /// # Arguments
    /// * `transport` - The link to the controller.
    /// * `cfg` - The initial configuration, see [`ControllerConfig`].
    pub fn try_new(transport: T, cfg: ControllerConfig) -> Result<Self, ControllerError> {
        let address = cfg.validate()?;
        let mut session = Session::new(transport, Settings::new(&cfg, address));
        debug!("Initializing controller for GPIB address {address}");

        let mut init = vec![
            (mnemonic::SAVECFG, "0".to_string()),
            (mnemonic::ADDR, address.to_string()),
            (mnemonic::MODE, "1".to_string()),
            (mnemonic::AUTO, flag(cfg.auto_read).to_string()),
            (mnemonic::EOI, flag(cfg.assert_eoi).to_string()),
            (mnemonic::EOS, cfg.gpib_termination.code().to_string()),
            (mnemonic::READ_TMO_MS, cfg.read_timeout_ms.to_string()),
            (mnemonic::EOT_CHAR, cfg.eot_char.to_string()),
            (mnemonic::EOT_ENABLE, "1".to_string()),
        ];
        if cfg.clear_on_init {
            init.push((mnemonic::CLR, String::new()));
        }
        init.push((mnemonic::SAVECFG, "1".to_string()));

        for (name, args) in init {
            session.sendcmd_controller(name, &args)?;
        }

        Ok(Controller {
            session: Arc::new(Mutex::new(session)),
        })
    }

    /// Get a copy of the cached controller configuration.
    pub fn settings(&self) -> Settings {
        self.session().settings.clone()
    }

    /// Send a command to the addressed instrument.
    pub fn sendcmd(&mut self, cmd: &str) -> Result<(), ControllerError> {
        self.session().sendcmd(cmd)
    }

    /// Send binary data to the addressed instrument.
    ///
    /// CR, LF, ESC, and `+` are escaped so that the controller passes them on.
    pub fn write_binary(&mut self, data: &[u8]) -> Result<(), ControllerError> {
        self.session().write_binary(data)
    }

    /// Query the addressed instrument and return the response as a trimmed String.
    ///
    /// If read-after-write is disabled, `++read eoi` is sent after the command. A reply that ends
    /// without the delimiter is returned as is, use [`Controller::query_reply`] if you need to know.
    pub fn query(&mut self, cmd: &str) -> Result<String, ControllerError> {
        Ok(self.query_reply(cmd)?.text())
    }

    /// Query the addressed instrument and return the raw [`Reply`].
    pub fn query_reply(&mut self, cmd: &str) -> Result<Reply, ControllerError> {
        self.session().query(cmd)
    }

    /// Read from the addressed instrument, e.g., after a command that produces output later on.
    pub fn read(&mut self) -> Result<String, ControllerError> {
        Ok(self.read_reply()?.text())
    }

    /// Read from the addressed instrument and return the raw [`Reply`].
    pub fn read_reply(&mut self) -> Result<Reply, ControllerError> {
        self.session().read()
    }

    /// Send a command to the controller itself.
    ///
    /// # Arguments
    /// * `name` - Mnemonic of the command without `++`, case does not matter.
    /// * `args` - Arguments of the command, can be empty.
    pub fn sendcmd_controller(&mut self, name: &str, args: &str) -> Result<(), ControllerError> {
        self.session().sendcmd_controller(name, args)
    }

    /// Query the controller itself and return the response as a trimmed String.
    pub fn query_controller(&mut self, name: &str, args: &str) -> Result<String, ControllerError> {
        Ok(self.session().query_controller(name, args)?.text())
    }

    /// Set the primary GPIB address of the instrument under control.
    ///
    /// A secondary address that is currently set is kept.
    pub fn set_primary_address(&mut self, address: u8) -> Result<(), ControllerError> {
        let primary = check_primary_address(address)?;
        let mut session = self.session();
        let address = GpibAddress::try_new(primary, session.settings.address.secondary())?;
        session.sendcmd_controller(mnemonic::ADDR, &address.to_string())?;
        session.settings.address = address;
        Ok(())
    }

    /// Set the secondary GPIB address of the instrument under control.
    pub fn set_secondary_address(&mut self, address: u8) -> Result<(), ControllerError> {
        let secondary = check_secondary_address(address)?;
        let mut session = self.session();
        let address = GpibAddress::try_new(session.settings.address.primary(), Some(secondary))?;
        session.sendcmd_controller(mnemonic::ADDR, &address.to_string())?;
        session.settings.address = address;
        Ok(())
    }

    /// Address the instrument by its primary address only.
    pub fn clear_secondary_address(&mut self) -> Result<(), ControllerError> {
        let mut session = self.session();
        let address = GpibAddress::try_new(session.settings.address.primary(), None)?;
        session.sendcmd_controller(mnemonic::ADDR, &address.to_string())?;
        session.settings.address = address;
        Ok(())
    }

    /// Set primary and secondary address at once.
    pub fn set_address(&mut self, address: GpibAddress) -> Result<(), ControllerError> {
        let mut session = self.session();
        session.sendcmd_controller(mnemonic::ADDR, &address.to_string())?;
        session.settings.address = address;
        Ok(())
    }

    /// Query the GPIB address from the controller.
    ///
    /// The controller answers with the primary address, followed by the secondary address if one
    /// is set. Addresses outside of the valid ranges are reported as an error.
    pub fn get_address(&mut self) -> Result<Synced<GpibAddress>, ControllerError> {
        let mut session = self.session();
        let response = raw_text(session.query_controller(mnemonic::ADDR, "")?);
        let address = parse_address(&response)?;
        Ok(reconcile(
            Setting::Address,
            &mut session.settings.address,
            address,
        ))
    }

    /// Enable or disable read-after-write.
    ///
    /// With read-after-write enabled, the controller addresses the instrument to talk after every
    /// command sent to it. Otherwise, queries send an explicit `++read eoi`.
    pub fn set_auto_read(&mut self, enable: bool) -> Result<(), ControllerError> {
        let mut session = self.session();
        session.sendcmd_controller(mnemonic::AUTO, flag(enable))?;
        session.settings.auto_read = enable;
        Ok(())
    }

    /// Query whether read-after-write is enabled.
    pub fn get_auto_read(&mut self) -> Result<Synced<bool>, ControllerError> {
        let mut session = self.session();
        let response = raw_text(session.query_controller(mnemonic::AUTO, "")?);
        let auto_read = parse_flag(mnemonic::AUTO, &response)?;
        Ok(reconcile(
            Setting::AutoRead,
            &mut session.settings.auto_read,
            auto_read,
        ))
    }

    /// Enable or disable the assertion of EOI with the last byte of instrument commands.
    pub fn set_assert_eoi(&mut self, enable: bool) -> Result<(), ControllerError> {
        let mut session = self.session();
        session.sendcmd_controller(mnemonic::EOI, flag(enable))?;
        session.settings.assert_eoi = enable;
        Ok(())
    }

    /// Query whether EOI is asserted with the last byte of instrument commands.
    pub fn get_assert_eoi(&mut self) -> Result<Synced<bool>, ControllerError> {
        let mut session = self.session();
        let response = raw_text(session.query_controller(mnemonic::EOI, "")?);
        let assert_eoi = parse_flag(mnemonic::EOI, &response)?;
        Ok(reconcile(
            Setting::AssertEoi,
            &mut session.settings.assert_eoi,
            assert_eoi,
        ))
    }

    /// Set the termination the controller appends to instrument commands on the GPIB side.
    pub fn set_gpib_termination(&mut self, term: GpibTerm) -> Result<(), ControllerError> {
        let mut session = self.session();
        session.sendcmd_controller(mnemonic::EOS, &term.code().to_string())?;
        session.settings.gpib_termination = term;
        Ok(())
    }

    /// Query the termination the controller appends to instrument commands.
    pub fn get_gpib_termination(&mut self) -> Result<Synced<GpibTerm>, ControllerError> {
        let mut session = self.session();
        let response = raw_text(session.query_controller(mnemonic::EOS, "")?);
        let code: u8 = parse_number(mnemonic::EOS, &response)?;
        let term = GpibTerm::try_from(code).map_err(|_| unparsable(mnemonic::EOS, &response))?;
        Ok(reconcile(
            Setting::GpibTermination,
            &mut session.settings.gpib_termination,
            term,
        ))
    }

    /// Set the read timeout of the controller in milliseconds.
    ///
    /// This is the time the controller waits for the instrument, not the timeout of the transport.
    /// Valid values are given by [`crate::READ_TIMEOUT_RANGE_MS`].
    pub fn set_read_timeout(&mut self, timeout_ms: u32) -> Result<(), ControllerError> {
        let timeout_ms = check_read_timeout(timeout_ms)?;
        let mut session = self.session();
        session.sendcmd_controller(mnemonic::READ_TMO_MS, &timeout_ms.to_string())?;
        session.settings.read_timeout_ms = timeout_ms;
        Ok(())
    }

    /// Query the read timeout of the controller in milliseconds.
    ///
    /// A value outside of the documented range is reported as an error.
    pub fn get_read_timeout(&mut self) -> Result<Synced<u32>, ControllerError> {
        let mut session = self.session();
        let response = raw_text(session.query_controller(mnemonic::READ_TMO_MS, "")?);
        let timeout_ms = check_read_timeout(parse_number(mnemonic::READ_TMO_MS, &response)?)?;
        Ok(reconcile(
            Setting::ReadTimeout,
            &mut session.settings.read_timeout_ms,
            timeout_ms,
        ))
    }

    /// Set the character that the controller appends to instrument data when it detects EOI.
    ///
    /// Replies are read up to this character.
    pub fn set_eot_char(&mut self, eot_char: u8) -> Result<(), ControllerError> {
        let mut session = self.session();
        session.sendcmd_controller(mnemonic::EOT_CHAR, &eot_char.to_string())?;
        session.settings.eot_char = eot_char;
        Ok(())
    }

    /// Enable or disable appending of the EOT character.
    ///
    /// With the EOT character disabled, replies only end when the transport reports the end of
    /// the stream or times out, and are then marked as incomplete.
    pub fn set_eot_enable(&mut self, enable: bool) -> Result<(), ControllerError> {
        let mut session = self.session();
        session.sendcmd_controller(mnemonic::EOT_ENABLE, flag(enable))?;
        session.settings.eot_enable = enable;
        Ok(())
    }

    /// Enable or disable saving of configuration changes to the controller's EEPROM.
    pub fn set_save_config(&mut self, enable: bool) -> Result<(), ControllerError> {
        self.sendcmd_controller(mnemonic::SAVECFG, flag(enable))
    }

    /// Query whether the GPIB SRQ line is asserted.
    pub fn get_service_request(&mut self) -> Result<bool, ControllerError> {
        let response = raw_text(self.session().query_controller(mnemonic::SRQ, "")?);
        parse_flag(mnemonic::SRQ, &response)
    }

    /// Serial poll the addressed instrument and return its status byte.
    pub fn serial_poll(&mut self) -> Result<u8, ControllerError> {
        let response = raw_text(self.session().query_controller(mnemonic::SPOLL, "")?);
        parse_number(mnemonic::SPOLL, &response)
    }

    /// Query the version string of the controller firmware.
    pub fn get_version(&mut self) -> Result<String, ControllerError> {
        self.query_controller(mnemonic::VER, "")
    }

    /// Send the Selected Device Clear (SDC) message to the addressed instrument.
    pub fn clear_device(&mut self) -> Result<(), ControllerError> {
        self.sendcmd_controller(mnemonic::CLR, "")
    }

    /// Assert the GPIB Interface Clear (IFC) line for 150 microseconds.
    ///
    /// This makes the controller the Controller-In-Charge on the bus.
    pub fn clear_interface(&mut self) -> Result<(), ControllerError> {
        self.sendcmd_controller(mnemonic::IFC, "")
    }

    /// Enable (local) or disable (local lockout) the front panel of the addressed instrument.
    pub fn set_front_panel(&mut self, enable: bool) -> Result<(), ControllerError> {
        let cmd = if enable { mnemonic::LOC } else { mnemonic::LLO };
        self.sendcmd_controller(cmd, "")
    }

    /// Send the Group Execute Trigger (GET) message to the addressed instrument.
    pub fn trigger(&mut self) -> Result<(), ControllerError> {
        self.sendcmd_controller(mnemonic::TRG, "")
    }

    /// Perform a power-on reset of the controller.
    ///
    /// The reset takes about 5 seconds and the controller ignores all input in the meantime.
    /// Afterwards the controller runs with its saved configuration, which might differ from the
    /// cached one. Query the settings you rely on to bring the cache back in sync.
    pub fn reset(&mut self) -> Result<(), ControllerError> {
        self.sendcmd_controller(mnemonic::RST, "")
    }

    fn session(&self) -> MutexGuard<'_, Session<T>> {
        self.session.lock().expect("Mutex should not be poisoned")
    }
}

impl<T: Transport> Clone for Controller<T> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

fn flag(enable: bool) -> &'static str {
    if enable { "1" } else { "0" }
}

/// The reply as received, only without the delimiter, for parsing and diagnostics.
fn raw_text(reply: Reply) -> String {
    String::from_utf8_lossy(reply.data()).into_owned()
}

fn unparsable(query: &str, response: &str) -> ControllerError {
    ControllerError::UnparsableResponse {
        query: format!("++{query}"),
        response: response.to_string(),
    }
}

fn parse_flag(query: &str, response: &str) -> Result<bool, ControllerError> {
    match response.trim() {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(unparsable(query, response)),
    }
}

fn parse_number<N: FromStr>(query: &str, response: &str) -> Result<N, ControllerError> {
    response
        .trim()
        .parse::<N>()
        .map_err(|_| unparsable(query, response))
}

fn parse_address(response: &str) -> Result<GpibAddress, ControllerError> {
    let mut parts = response.split_whitespace();
    let primary = match parts.next() {
        Some(primary) => parse_number(mnemonic::ADDR, primary)?,
        None => return Err(unparsable(mnemonic::ADDR, response)),
    };
    let secondary = parts
        .next()
        .map(|secondary| parse_number(mnemonic::ADDR, secondary))
        .transpose()?;
    if parts.next().is_some() {
        return Err(unparsable(mnemonic::ADDR, response));
    }
    GpibAddress::try_new(primary, secondary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let addr = parse_address("5 96\r").unwrap();
        assert_eq!(addr.primary(), 5);
        assert_eq!(addr.secondary(), Some(96));
        assert!(parse_address("").is_err());
        assert!(parse_address("5 96 97").is_err());
    }

    #[test]
    fn test_parse_flag_keeps_raw_response() {
        match parse_flag(mnemonic::SRQ, " yes\r") {
            Err(ControllerError::UnparsableResponse { query, response }) => {
                assert_eq!(query, "++srq");
                assert_eq!(response, " yes\r");
            }
            _ => panic!("Expected an unparsable response error."),
        }
    }
}
