//! UDP sender: streams fill-pattern source symbols with interleaved repair
//! symbols, dropping packets through the artificial loss model before they
//! reach the socket.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use bytes::BytesMut;
use clap::Parser;
use slipstream_codec::wire::{FecOti, RepairFpi};
use slipstream_codec::{new_encoder, Codepoint, SwEncoder as _};
use slipstream_sim::{source_symbol, LossModel, RepairCadence, SYMBOL_SIZE};
use tokio::net::UdpSocket;
use tokio::time;
use tracing_subscriber::EnvFilter;

/// Lossy-channel FEC sender.
#[derive(Parser, Debug)]
#[command(name = "slipstream-sender", about = "Slipstream FEC demo sender")]
struct Cli {
    /// Receiver address.
    #[arg(long, default_value = "127.0.0.1:10400")]
    dest: SocketAddr,

    /// Fraction of packets dropped before sending.
    #[arg(long, default_value_t = 0.10)]
    loss_rate: f64,

    /// Encoding window size in symbols (>= 2).
    #[arg(long, default_value_t = 4)]
    window_size: usize,

    /// Code rate: sources / (sources + repairs), in (0, 1].
    #[arg(long, default_value_t = 0.75)]
    code_rate: f64,

    /// Coding density, 1-15 (15 = full density).
    #[arg(long, default_value_t = 15)]
    density: u8,

    /// Number of source symbols to send.
    #[arg(long, default_value_t = 1000)]
    total: u32,

    /// Loss model seed.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Inter-packet pacing in microseconds.
    #[arg(long, default_value_t = 500)]
    pace_us: u64,
}

fn frame(fpi: &RepairFpi, payload: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(RepairFpi::ENCODED_LEN + payload.len());
    fpi.encode(&mut buf);
    buf.extend_from_slice(payload);
    buf
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!(
        dest = %cli.dest,
        loss_rate = cli.loss_rate,
        window = cli.window_size,
        code_rate = cli.code_rate,
        density = cli.density,
        total = cli.total,
        "slipstream sender starting"
    );

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(cli.dest).await?;

    let mut encoder = new_encoder(Codepoint::RlcGf256FullDensity, SYMBOL_SIZE, cli.window_size)?;
    let mut loss = LossModel::new(cli.loss_rate, cli.seed);
    let mut cadence = RepairCadence::new(cli.code_rate);

    let total_encoding = (cli.total as f64 / cli.code_rate).ceil() as u32;
    let oti = FecOti {
        codepoint: Codepoint::RlcGf256FullDensity.as_u32(),
        encoding_window_size: cli.window_size as u32,
        total_source_symbols: cli.total,
        total_encoding_symbols: total_encoding,
    };
    // Session parameters go out ahead of the stream, outside the loss model.
    let mut oti_buf = BytesMut::new();
    oti.encode(&mut oti_buf);
    socket.send(&oti_buf).await?;

    let mut encoding_symbol_count = 0u32;
    let mut dropped_sources = 0u32;
    let mut sent_repairs = 0u32;
    let mut dropped_repairs = 0u32;

    for esi in 0..cli.total {
        let data = source_symbol(esi);
        encoder.add_source_symbol_to_coding_window(data.clone(), esi)?;
        encoding_symbol_count += 1;

        if loss.should_drop() {
            dropped_sources += 1;
            tracing::debug!(esi, "source symbol dropped by loss model");
        } else {
            let fpi = RepairFpi::source(esi, cli.density);
            socket.send(&frame(&fpi, &data)).await?;
        }

        for _ in 0..cadence.on_source() {
            // The running encoding-symbol index doubles as the repair key,
            // truncated to the 16-bit wire field.
            let key = encoding_symbol_count as u16;
            encoder.generate_coding_coefs(key, cli.density)?;
            let repair = encoder.build_repair_symbol()?;
            let info = encoder.get_coding_window_information()?;
            encoding_symbol_count += 1;

            if loss.should_drop() {
                dropped_repairs += 1;
                tracing::debug!(key, "repair symbol dropped by loss model");
                continue;
            }
            let fpi = RepairFpi::repair(key, cli.density, info.nss as u16, info.first);
            socket.send(&frame(&fpi, &repair)).await?;
            sent_repairs += 1;
        }

        time::sleep(Duration::from_micros(cli.pace_us)).await;
    }

    tracing::info!(
        sources = cli.total,
        dropped_sources,
        sent_repairs,
        dropped_repairs,
        "stream complete"
    );
    Ok(())
}
