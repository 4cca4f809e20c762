use std::time::Duration;

use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::Instant,
};

/// Delays propagation of a rapidly changing value until it has been stable
/// for a quiet period.
///
/// Values pushed with [`Debouncer::set`] are forwarded to subscribers only after
/// `delay` has elapsed with no newer value. A newer value discards the pending
/// one, so downstream only ever observes the last value of a burst. A burst
/// that ends on the value already settled notifies nobody.
///
/// A background task owns the timer. Dropping the debouncer (or calling
/// [`Debouncer::cancel`]) stops the task and discards any pending value;
/// subscribers then see their channel close.
pub struct Debouncer<T> {
    input_tx: mpsc::UnboundedSender<T>,
    output_rx: watch::Receiver<T>,
    delay: Duration,
    task: JoinHandle<()>,
}

impl<T> Debouncer<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Creates a debouncer whose settled value starts at `initial`
    pub fn new(initial: T, delay: Duration) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output_rx) = watch::channel(initial);

        let task = tokio::spawn(async move {
            Self::timer_task(input_rx, output_tx, delay).await;
        });

        Self {
            input_tx,
            output_rx,
            delay,
            task,
        }
    }

    /// Background task that holds the pending value until the quiet period ends
    async fn timer_task(
        mut input_rx: mpsc::UnboundedReceiver<T>,
        output_tx: watch::Sender<T>,
        delay: Duration,
    ) {
        let mut pending: Option<T> = None;
        let timer = tokio::time::sleep(delay);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                // An expired timer wins over a value arriving in the same tick
                biased;

                () = &mut timer, if pending.is_some() => {
                    if let Some(value) = pending.take() {
                        output_tx.send_if_modified(|current| {
                            if *current == value {
                                return false;
                            }
                            *current = value;
                            true
                        });
                    }
                }
                received = input_rx.recv() => match received {
                    Some(value) => {
                        pending = Some(value);
                        timer.as_mut().reset(Instant::now() + delay);
                    }
                    None => {
                        if pending.is_some() {
                            tracing::trace!("Debouncer closed with a pending value; discarding");
                        }
                        break;
                    }
                },
            }
        }
    }

    /// Records a new source value, superseding any value still waiting
    pub fn set(&self, value: T) {
        if self.input_tx.send(value).is_err() {
            tracing::debug!("Debouncer already torn down; ignoring value");
        }
    }

    /// Returns a receiver notified each time a different value settles
    ///
    /// The receiver starts out with the current settled value marked as seen.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        let mut rx = self.output_rx.clone();
        rx.borrow_and_update();
        rx
    }

    /// The most recently settled value
    pub fn current(&self) -> T {
        self.output_rx.borrow().clone()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Stops the timer task; a pending value is never delivered
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
