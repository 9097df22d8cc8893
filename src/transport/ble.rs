//! BLE hub session over the Pybricks GATT profile, backed by bluer.
//!
//! One characteristic carries both directions: commands are written to it,
//! status events arrive as notifications on it. A program run is over when
//! the user-program-running flag falls after having risen.

use super::{HubConnector, HubSession};
use anyhow::{anyhow, Context, Result};
use bluer::gatt::remote::Characteristic;
use bluer::{Adapter, AdapterEvent, Device, Uuid};
use bytes::{BufMut, BytesMut};
use futures::StreamExt;
use tracing::{debug, info};

/// Pybricks GATT service and its command/event characteristic.
const PYBRICKS_SERVICE: Uuid = Uuid::from_u128(0xc5f50001_8280_46da_89f4_6d8051e4aeef);
const PYBRICKS_COMMAND_EVENT: Uuid = Uuid::from_u128(0xc5f50002_8280_46da_89f4_6d8051e4aeef);

// Pybricks profile command opcodes.
const CMD_STOP_USER_PROGRAM: u8 = 0x00;
const CMD_START_USER_PROGRAM: u8 = 0x01;
const CMD_WRITE_USER_PROGRAM_META: u8 = 0x03;
const CMD_WRITE_USER_RAM: u8 = 0x04;

// Status report event and the user-program-running flag within it.
const EVT_STATUS_REPORT: u8 = 0x00;
const FLAG_PROGRAM_RUNNING: u32 = 1 << 6;

/// Upload chunk size, conservative for the default ATT MTU.
const CHUNK_SIZE: usize = 100;

/// Finds Pybricks hubs by their advertised name.
pub struct PybricksConnector {
    adapter: Adapter,
}

impl PybricksConnector {
    pub async fn new() -> Result<Self> {
        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;
        adapter.set_powered(true).await?;
        Ok(Self { adapter })
    }
}

#[async_trait::async_trait]
impl HubConnector for PybricksConnector {
    /// Scan until a device advertising `name` appears. The scan stream
    /// never ends on its own; the caller bounds this with a timeout.
    async fn discover(&self, name: &str) -> Result<Option<Box<dyn HubSession>>> {
        let events = self.adapter.discover_devices().await?;
        tokio::pin!(events);

        while let Some(event) = events.next().await {
            let AdapterEvent::DeviceAdded(addr) = event else {
                continue;
            };
            let device = self.adapter.device(addr)?;
            match device.name().await.ok().flatten() {
                Some(advertised) if advertised == name => {
                    info!("[BLE] Found hub {name} at {addr}");
                    return Ok(Some(Box::new(PybricksSession::new(device))));
                }
                advertised => debug!("[BLE] Skipping {addr} ({advertised:?})"),
            }
        }
        Ok(None)
    }
}

/// A session with one Pybricks hub.
pub struct PybricksSession {
    device: Device,
    command_event: Option<Characteristic>,
}

impl PybricksSession {
    fn new(device: Device) -> Self {
        Self {
            device,
            command_event: None,
        }
    }

    fn characteristic(&self) -> Result<&Characteristic> {
        self.command_event
            .as_ref()
            .ok_or_else(|| anyhow!("session not connected"))
    }
}

#[async_trait::async_trait]
impl HubSession for PybricksSession {
    async fn connect(&mut self) -> Result<()> {
        if !self.device.is_connected().await? {
            self.device.connect().await.context("BLE connect")?;
        }
        for service in self.device.services().await? {
            if service.uuid().await? != PYBRICKS_SERVICE {
                continue;
            }
            for characteristic in service.characteristics().await? {
                if characteristic.uuid().await? == PYBRICKS_COMMAND_EVENT {
                    self.command_event = Some(characteristic);
                    info!("[BLE] Pybricks service resolved");
                    return Ok(());
                }
            }
        }
        Err(anyhow!("Pybricks command characteristic not found on hub"))
    }

    async fn run(&mut self, program: &str) -> Result<()> {
        let characteristic = self.characteristic()?;
        let events = characteristic
            .notify()
            .await
            .context("subscribe to hub status events")?;
        tokio::pin!(events);

        // Stop anything running, invalidate the stored program, upload the
        // new one chunk by chunk, then commit the real length and start.
        characteristic.write(&[CMD_STOP_USER_PROGRAM]).await?;
        characteristic.write(&program_meta(0)).await?;

        let payload = program.as_bytes();
        for (index, chunk) in payload.chunks(CHUNK_SIZE).enumerate() {
            let mut frame = BytesMut::with_capacity(5 + chunk.len());
            frame.put_u8(CMD_WRITE_USER_RAM);
            frame.put_u32_le((index * CHUNK_SIZE) as u32);
            frame.put_slice(chunk);
            characteristic.write(&frame).await?;
        }
        characteristic.write(&program_meta(payload.len() as u32)).await?;
        characteristic.write(&[CMD_START_USER_PROGRAM]).await?;
        debug!("[BLE] Program started ({} bytes)", payload.len());

        let mut seen_running = false;
        while let Some(event) = events.next().await {
            if event.first() != Some(&EVT_STATUS_REPORT) || event.len() < 5 {
                continue;
            }
            let flags = u32::from_le_bytes([event[1], event[2], event[3], event[4]]);
            if flags & FLAG_PROGRAM_RUNNING != 0 {
                seen_running = true;
            } else if seen_running {
                debug!("[BLE] Program finished");
                return Ok(());
            }
        }
        Err(anyhow!("hub event stream ended mid-run"))
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.command_event = None;
        self.device.disconnect().await.context("BLE disconnect")
    }
}

fn program_meta(len: u32) -> [u8; 5] {
    let mut frame = [0u8; 5];
    frame[0] = CMD_WRITE_USER_PROGRAM_META;
    frame[1..].copy_from_slice(&len.to_le_bytes());
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_meta_encodes_length_little_endian() {
        assert_eq!(program_meta(0), [0x03, 0, 0, 0, 0]);
        assert_eq!(program_meta(0x0102), [0x03, 0x02, 0x01, 0, 0]);
    }
}
