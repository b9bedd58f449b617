use super::*;

pub(crate) struct Controller {
    client: Client,
    cpu_cores: usize,
    extranonce1: Extranonce,
    extranonce2: Arc<ExtranonceCounter>,
    job_cancel: Option<CancellationToken>,
    hashers: JoinSet<()>,
    metrics: Arc<Metrics>,
    notify_tx: watch::Sender<Option<(Notify, CancellationToken)>>,
    notify_rx: watch::Receiver<Option<(Notify, CancellationToken)>>,
    pool_difficulty: Difficulty,
    cancel: CancellationToken,
    share_tx: mpsc::Sender<Solution>,
    share_rx: mpsc::Receiver<Solution>,
    shares: Vec<Share>,
    once: bool,
}

impl Controller {
    pub(crate) async fn run(
        client: Client,
        cpu_cores: usize,
        once: bool,
        cancel: CancellationToken,
    ) -> Result<Vec<Share>> {
        let events = client
            .connect()
            .await
            .context("failed to connect to stratum pool")?;

        let subscribe = client.subscribe().await.context("mining.subscribe failed")?;

        client.authorize().await.context("mining.authorize failed")?;

        info!(
            "Authorized: extranonce1={}, extranonce2_size={}",
            subscribe.extranonce1, subscribe.extranonce2_size
        );

        let (share_tx, share_rx) = mpsc::channel(16);
        let (notify_tx, notify_rx) = watch::channel(None);

        let mut controller = Self {
            client,
            cpu_cores,
            extranonce1: subscribe.extranonce1,
            extranonce2: Arc::new(ExtranonceCounter::new(subscribe.extranonce2_size)),
            job_cancel: None,
            hashers: JoinSet::new(),
            metrics: Arc::new(Metrics::new(cpu_cores)),
            notify_tx,
            notify_rx,
            pool_difficulty: Difficulty::default(),
            cancel,
            share_tx,
            share_rx,
            shares: Vec::new(),
            once,
        };

        controller.spawn_hashers();
        controller.spawn_reporter();

        let result = controller.event_loop(events).await;

        controller.cancel.cancel();
        drop(controller.notify_tx);
        // Closing the solution channel unblocks any worker parked on a full
        // send, so the join below cannot hang.
        drop(controller.share_rx);
        while controller.hashers.join_next().await.is_some() {}
        controller.client.disconnect().await;

        result?;

        Ok(controller.shares)
    }

    async fn event_loop(&mut self, mut events: EventReceiver) -> Result {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("Shutting down stratum session and workers");
                    break;
                },
                event = events.recv() => {
                    match event {
                        Ok(Event::Notify(notify)) => self.handle_notify(notify),
                        Ok(Event::SetDifficulty(difficulty)) => self.handle_set_difficulty(difficulty),
                        Ok(Event::Disconnected) => bail!("disconnected from stratum pool"),
                        Err(broadcast::error::RecvError::Lagged(count)) => {
                            warn!("Event stream lagged, missed {count} messages");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            info!("Event channel closed, shutting down");
                            break;
                        }
                    }
                },
                maybe = self.share_rx.recv() => {
                    match maybe {
                        Some(solution) => {
                            let accepted = self.handle_solution(solution).await;

                            if accepted && self.once {
                                info!("Share submitted, exiting");
                                break;
                            }
                        }
                        None => {
                            info!("Solution channel closed");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_notify(&mut self, notify: Notify) {
        info!(
            "New job: job_id={} clean_jobs={}",
            notify.job_id, notify.clean_jobs
        );

        let cancel = self.preempt();
        self.notify_tx.send_replace(Some((notify, cancel)));
    }

    fn handle_set_difficulty(&mut self, difficulty: Difficulty) {
        // Recorded for logging only. The share target stays nbits-derived.
        self.pool_difficulty = difficulty;
        info!("Pool difficulty is now {}", self.pool_difficulty);
    }

    /// A share for a replaced job would be stale by the time it reaches the
    /// pool, so every notify cancels the in-flight search, clean_jobs or
    /// not. Solutions already queued are still submitted.
    fn preempt(&mut self) -> CancellationToken {
        if let Some(cancel) = self.job_cancel.take() {
            cancel.cancel();
        }

        let cancel = self.cancel.child_token();
        self.job_cancel = Some(cancel.clone());
        cancel
    }

    async fn handle_solution(&mut self, solution: Solution) -> bool {
        let Solution {
            worker,
            job_id,
            extranonce2,
            header,
        } = solution;

        info!(
            "Worker {worker} found share: nonce={} hash={}",
            Nonce::from(header.nonce),
            header.block_hash(),
        );

        let share = Share {
            extranonce1: self.extranonce1.clone(),
            extranonce2: extranonce2.clone(),
            job_id: job_id.clone(),
            nonce: header.nonce.into(),
            ntime: header.time.into(),
            username: self.client.username().to_string(),
        };

        match self
            .client
            .submit(job_id.clone(), extranonce2, header.time.into(), header.nonce.into())
            .await
        {
            Ok(_) => {
                info!("Share for job {job_id} accepted");
                self.shares.push(share);
                true
            }
            Err(err) => {
                warn!("Share for job {job_id} rejected: {err}");
                false
            }
        }
    }

    fn spawn_hashers(&mut self) {
        for worker in 0..self.cpu_cores {
            let mut notify_rx = self.notify_rx.clone();
            let share_tx = self.share_tx.clone();
            let extranonce1 = self.extranonce1.clone();
            let extranonce2 = self.extranonce2.clone();
            let metrics = self.metrics.clone();
            let session_cancel = self.cancel.clone();

            info!("Starting worker {worker}");

            self.hashers.spawn(async move {
                loop {
                    if notify_rx.changed().await.is_err() {
                        break;
                    }

                    let Some((notify, cancel)) = notify_rx.borrow_and_update().clone() else {
                        continue;
                    };

                    loop {
                        if cancel.is_cancelled() {
                            break;
                        }

                        let extranonce2 = match extranonce2.reserve() {
                            Ok(extranonce2) => extranonce2,
                            Err(err) => {
                                error!("Worker {worker} failed to reserve extranonce2: {err}");
                                session_cancel.cancel();
                                return;
                            }
                        };

                        let hasher = match Hasher::new(worker, &notify, &extranonce1, extranonce2) {
                            Ok(hasher) => hasher,
                            Err(err) => {
                                warn!(
                                    "Worker {worker} cannot build header for job {}: {err}",
                                    notify.job_id
                                );
                                break;
                            }
                        };

                        let search_cancel = cancel.clone();
                        let search_metrics = metrics.clone();

                        let result = task::spawn_blocking(move || {
                            hasher.search(&search_cancel, &search_metrics)
                        })
                        .await;

                        match result {
                            Ok(Ok(solution)) => {
                                if share_tx.send(solution).await.is_err() {
                                    return;
                                }
                            }
                            Ok(Err(err)) => {
                                if cancel.is_cancelled() {
                                    break;
                                }

                                // Nonce space exhausted; the next extranonce2
                                // reservation opens a fresh search space.
                                debug!("Worker {worker}: {err}");
                                continue;
                            }
                            Err(_) => return,
                        }
                    }
                }
            });
        }
    }

    fn spawn_reporter(&mut self) {
        let metrics = self.metrics.clone();
        let cancel = self.cancel.clone();
        let plain = !integration_test() && !logs_enabled();

        self.hashers
            .spawn(metrics::report(metrics, Duration::from_secs(5), plain, cancel));
    }
}
