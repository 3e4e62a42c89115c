//! Linux I²C register bus over `/dev/i2c-*`.
//!
//! The device handle is opened once and the slave address selected with
//! the `I2C_SLAVE` ioctl; after that a register write is a plain 2-byte
//! write and a register read is a 1-byte register-pointer write followed
//! by a 1-byte read. A mutex serializes transactions so compound driver
//! operations are never interleaved on the wire.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::fd::AsRawFd;
use std::path::Path;

use parking_lot::Mutex;
use tracing::info;

use roof_common::hal::bus::{BusError, RegisterBus};

const I2C_SLAVE: i32 = 0x0703;

nix::ioctl_write_int_bad!(i2c_set_slave_address, I2C_SLAVE);

/// Register bus backed by a Linux I²C character device.
pub struct LinuxI2cBus {
    device: Mutex<File>,
    path: String,
    address: u16,
}

impl LinuxI2cBus {
    /// Open the bus device and select the expander's 7-bit address.
    pub fn open(path: &Path, address: u16) -> Result<Self, BusError> {
        let device = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| BusError::Open {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        unsafe { i2c_set_slave_address(device.as_raw_fd(), address as i32) }.map_err(
            |e| BusError::AddressSelect {
                address,
                reason: e.to_string(),
            },
        )?;

        info!(path = %path.display(), "I2C bus opened at address 0x{address:02x}");
        Ok(Self {
            device: Mutex::new(device),
            path: path.display().to_string(),
            address,
        })
    }
}

impl RegisterBus for LinuxI2cBus {
    fn read_register(&self, register: u8) -> Result<u8, BusError> {
        let mut device = self.device.lock();
        device
            .write_all(&[register])
            .map_err(|e| BusError::Read {
                register,
                reason: e.to_string(),
            })?;
        let mut value = [0u8; 1];
        device.read_exact(&mut value).map_err(|e| BusError::Read {
            register,
            reason: e.to_string(),
        })?;
        Ok(value[0])
    }

    fn write_register(&self, register: u8, value: u8) -> Result<(), BusError> {
        let mut device = self.device.lock();
        device
            .write_all(&[register, value])
            .map_err(|e| BusError::Write {
                register,
                reason: e.to_string(),
            })
    }

    fn describe(&self) -> String {
        format!("{}@0x{:02x}", self.path, self.address)
    }

    fn is_physical(&self) -> bool {
        true
    }
}
