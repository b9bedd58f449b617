use super::*;

/// Per-worker hash counters. Each worker only ever adds to its own slot;
/// the reporter swaps every slot to zero when it closes a window, so no
/// hash is dropped or double counted.
pub(crate) struct Metrics {
    counters: Vec<AtomicU64>,
    started: Instant,
}

impl Metrics {
    pub(crate) fn new(workers: usize) -> Self {
        Self {
            counters: (0..workers).map(|_| AtomicU64::new(0)).collect(),
            started: Instant::now(),
        }
    }

    pub(crate) fn add(&self, worker: usize, hashes: u64) {
        self.counters[worker].fetch_add(hashes, Ordering::Relaxed);
    }

    pub(crate) fn drain(&self) -> u64 {
        self.counters
            .iter()
            .map(|counter| counter.swap(0, Ordering::Relaxed))
            .sum()
    }

    pub(crate) fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

pub(crate) async fn report(
    metrics: Arc<Metrics>,
    period: Duration,
    plain: bool,
    cancel: CancellationToken,
) {
    const FRAMES: [&str; 8] = ["⣷", "⣯", "⣟", "⡿", "⢿", "⣻", "⣽", "⣾"];

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately.
    ticker.tick().await;

    let mut frame = 0;
    let mut previous = Instant::now();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let now = Instant::now();
        let window = now.duration_since(previous);
        previous = now;

        let hash_rate = HashRate::over(metrics.drain(), window);

        if plain {
            let spinner = FRAMES[frame % FRAMES.len()];
            frame = frame.wrapping_add(1);

            let mut out = io::stdout();
            let _ = write!(
                out,
                "\r\x1b[2K {spinner}  hashrate={hash_rate}  uptime={:.1}s",
                metrics.uptime().as_secs_f64()
            );
            let _ = out.flush();
        } else {
            info!("Hashrate: {hash_rate}");
        }
    }
}
