//! UDP receiver: repairs the incoming symbol stream and reports how much of
//! the original source stream was delivered or recovered.

use std::cell::RefCell;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use slipstream_codec::wire::{FecOti, RepairFpi};
use slipstream_codec::{new_decoder, Codepoint, SwDecoder as _};
use slipstream_sim::{verify_symbol, SYMBOL_SIZE};
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

/// Lossy-channel FEC receiver.
#[derive(Parser, Debug)]
#[command(name = "slipstream-receiver", about = "Slipstream FEC demo receiver")]
struct Cli {
    /// Listen address.
    #[arg(long, default_value = "0.0.0.0:10400")]
    bind: SocketAddr,

    /// Maximum number of equations retained by the decoder.
    #[arg(long, default_value_t = 256)]
    max_system_size: usize,

    /// Stop after this long without a packet.
    #[arg(long, default_value_t = 5)]
    idle_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let socket = UdpSocket::bind(cli.bind).await?;
    tracing::info!(bind = %cli.bind, "slipstream receiver listening");

    let mut buf = vec![0u8; RepairFpi::ENCODED_LEN + SYMBOL_SIZE + 64];
    let idle = Duration::from_secs(cli.idle_timeout_secs);

    // Session parameters arrive ahead of the stream.
    let (n, _) = socket.recv_from(&mut buf).await?;
    let oti = FecOti::decode(&mut &buf[..n]).context("truncated FEC OTI")?;
    let codepoint = Codepoint::from_u32(oti.codepoint)?;
    tracing::info!(
        window = oti.encoding_window_size,
        total_source = oti.total_source_symbols,
        total_encoding = oti.total_encoding_symbols,
        "session parameters received"
    );

    let mut decoder = new_decoder(
        codepoint,
        SYMBOL_SIZE,
        oti.encoding_window_size as usize,
        cli.max_system_size,
    )?;

    // Source symbols accounted for, whether received or recovered.
    let delivered = Rc::new(RefCell::new(HashSet::new()));
    let recovered = Rc::new(RefCell::new(0u32));
    let corrupt = Rc::new(RefCell::new(0u32));
    {
        let delivered = delivered.clone();
        let recovered = recovered.clone();
        let corrupt = corrupt.clone();
        decoder.set_source_symbol_decoded_callback(Box::new(move |esi, data| {
            if verify_symbol(esi, data) {
                tracing::debug!(esi, "source symbol recovered");
                if delivered.borrow_mut().insert(esi) {
                    *recovered.borrow_mut() += 1;
                }
            } else {
                tracing::warn!(esi, "recovered symbol fails the fill-pattern check");
                *corrupt.borrow_mut() += 1;
            }
        }));
    }

    let mut received_sources = 0u32;
    let mut received_repairs = 0u32;

    loop {
        let n = match timeout(idle, socket.recv_from(&mut buf)).await {
            Ok(res) => res?.0,
            Err(_) => {
                tracing::info!("idle timeout, ending session");
                break;
            }
        };
        let mut slice = &buf[..n];
        let Some(fpi) = RepairFpi::decode(&mut slice) else {
            tracing::warn!(len = n, "short datagram, skipping");
            continue;
        };
        if slice.len() != SYMBOL_SIZE {
            tracing::warn!(len = slice.len(), "unexpected symbol size, skipping");
            continue;
        }

        if fpi.is_source() {
            received_sources += 1;
            delivered.borrow_mut().insert(fpi.esi);
            if let Err(e) = decoder.decode_with_new_source_symbol(slice, fpi.esi) {
                tracing::warn!(esi = fpi.esi, error = %e, "source symbol rejected");
            }
        } else {
            received_repairs += 1;
            decoder.reset_coding_window();
            // Saturating end: a malformed header near u32::MAX must not wrap
            // the range; the decoder rejects the truncated window instead.
            let staged = (fpi.esi..fpi.esi.saturating_add(fpi.nss() as u32))
                .try_for_each(|esi| decoder.add_source_symbol_to_coding_window(esi))
                .and_then(|()| {
                    decoder
                        .generate_coding_coefs(fpi.repair_key, fpi.density())
                        .map(|_| ())
                })
                .and_then(|()| decoder.decode_with_new_repair_symbol(slice));
            if let Err(e) = staged {
                tracing::warn!(
                    key = fpi.repair_key,
                    first = fpi.esi,
                    nss = fpi.nss(),
                    error = %e,
                    "repair symbol rejected"
                );
            }
        }

        if delivered.borrow().len() as u32 >= oti.total_source_symbols {
            tracing::info!("all source symbols accounted for");
            break;
        }
    }

    let delivered = delivered.borrow().len() as u32;
    let recovered = *recovered.borrow();
    let corrupt = *corrupt.borrow();
    tracing::info!(
        total = oti.total_source_symbols,
        delivered,
        received_sources,
        received_repairs,
        recovered,
        corrupt,
        missing = oti.total_source_symbols.saturating_sub(delivered),
        "session summary"
    );
    Ok(())
}
