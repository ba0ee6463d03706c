//! Quadrascope demo
//!
//! Fills four sample slots with simple waveforms, plays one on each voice
//! and prints the VU bars plus a text rendering of channel 0's scope strip.
//!
//! Usage: `scope-demo [seconds] [config.json]`

use std::env;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use paula_scopes::constants::{AMIGA_VOICES, VU_MAX_HEIGHT};
use paula_scopes::{FrameBuffer, HostState, ScopeConfig, ScopeSystem};

const DEMO_SLOT_SIZE: u32 = 4096;
const PRINT_INTERVAL: Duration = Duration::from_millis(100);
const BAR_WIDTH: usize = 24;

/// (period, volume) per voice
const VOICES: [(i32, u8); AMIGA_VOICES] = [(428, 64), (214, 48), (856, 32), (320, 16)];

fn synth_waveform(kind: usize, len: usize) -> Vec<i8> {
    (0..len)
        .map(|i| {
            let phase = (i % 64) as f32 / 64.0;
            let value = match kind {
                0 => (phase * std::f32::consts::TAU).sin(),
                1 => {
                    if phase < 0.5 {
                        1.0
                    } else {
                        -1.0
                    }
                }
                2 => 2.0 * phase - 1.0,
                _ => 1.0 - 4.0 * (phase - 0.5).abs(),
            };
            (value * 127.0) as i8
        })
        .collect()
}

fn volume_bar(level: u8) -> String {
    let filled = level as usize * BAR_WIDTH / VU_MAX_HEIGHT as usize;
    format!("{}{}", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let seconds: f64 = match args.next() {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("invalid duration: {arg}"))?,
        None => 3.0,
    };
    let mut config = match args.next() {
        Some(path) => ScopeConfig::from_file(&path)
            .with_context(|| format!("failed to load config {path}"))?,
        None => ScopeConfig::default(),
    };
    config.max_sample_length = config.max_sample_length.min(DEMO_SLOT_SIZE);

    let system = ScopeSystem::new(config)?;
    let bank = system.bank();

    for (ch, &(period, volume)) in VOICES.iter().enumerate() {
        let start = bank.arena().slot_offset(ch);
        let len = bank.arena().slot_size();
        bank.arena().write(start, &synth_waveform(ch, len));

        bank.set_volume(ch, volume);
        bank.set_period(ch, period);
        bank.trigger(ch, Some(start), len as i32);
    }

    let host = Arc::new(HostState::new());
    system.start(Arc::clone(&host))?;

    let layout = system.config().layout;
    let renderer = system.renderer();
    let rows = layout.y + layout.height;
    let mut pixels = vec![0u32; layout.stride * rows];

    let started = Instant::now();
    while started.elapsed().as_secs_f64() < seconds {
        std::thread::sleep(PRINT_INTERVAL);

        renderer.draw(&bank, &mut FrameBuffer::new(&mut pixels, layout.stride));

        let levels = system.vu_levels();
        for (ch, level) in levels.iter().enumerate() {
            println!("ch{ch} [{}] {level:>2}", volume_bar(*level));
        }
        let x0 = layout.channel_x(0);
        for row in layout.y..rows {
            let line: String = (x0..x0 + layout.width)
                .map(|x| match pixels.get(row * layout.stride + x) {
                    Some(&p) if p != 0 => '*',
                    _ => ' ',
                })
                .collect();
            println!("|{line}|");
        }
        println!();
    }

    host.set_running(false);
    system.shutdown();
    println!("Scope demo complete after {seconds:.1}s");
    Ok(())
}
