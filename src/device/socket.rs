use std::{io::ErrorKind, net::UdpSocket};

use bytes::Buf;
use chrono::DateTime;
use log::info;

use super::{AlignmentStatus, Error, NavSample, PosSource};

/// Wire length of one navigation record: a microsecond timestamp, eleven
/// little-endian doubles, and the alignment status byte.
pub const NAV_RECORD_LEN: usize = 8 + 11 * 8 + 1;

/// Live device source. The positioning unit streams one fixed-format record
/// per navigation solution as a UDP datagram.
#[derive(Debug)]
pub struct UdpSource {
    socket: UdpSocket,
}

impl UdpSource {
    pub fn bind(address: &str) -> Result<Self, Error> {
        let socket = UdpSocket::bind(address)?;
        socket.set_nonblocking(true)?;

        info!("Listening for navigation records on {address}");

        Ok(Self { socket })
    }
}

impl PosSource for UdpSource {
    fn poll(&mut self) -> Result<Option<NavSample>, Error> {
        let mut buf = [0u8; 512];

        match self.socket.recv(&mut buf) {
            Ok(len) => decode_record(&buf[..len]).map(Some),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn decode_record(mut raw: &[u8]) -> Result<NavSample, Error> {
    if raw.len() < NAV_RECORD_LEN {
        return Err(Error::ShortRecord { len: raw.len() });
    }

    let time_us = raw.get_i64_le();
    let time = DateTime::from_timestamp_micros(time_us).ok_or(Error::BadTimestamp(time_us))?;

    let lat_deg = raw.get_f64_le();
    let lon_deg = raw.get_f64_le();
    let alt_m = raw.get_f64_le();
    let heading_deg = raw.get_f64_le();
    let roll_deg = raw.get_f64_le();
    let pitch_deg = raw.get_f64_le();
    let speed_mps = raw.get_f64_le();
    let vel_down_mps = raw.get_f64_le();
    let arate_lon_dps = raw.get_f64_le();
    let arate_trans_dps = raw.get_f64_le();
    let arate_down_dps = raw.get_f64_le();

    let code = raw.get_u8();
    let alignment = AlignmentStatus::from_code(code).ok_or(Error::BadAlignment(code))?;

    Ok(NavSample {
        time,
        lat_deg,
        lon_deg,
        alt_m,
        heading_deg,
        roll_deg,
        pitch_deg,
        speed_mps,
        vel_down_mps,
        arate_lon_dps,
        arate_trans_dps,
        arate_down_dps,
        alignment,
    })
}
