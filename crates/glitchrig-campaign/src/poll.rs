//! Bounded waits over a [`FrameLink`].
//!
//! Every wait has a deadline. Transport read errors inside a wait count as
//! "nothing arrived yet"; the deadline is what ends the wait.

use std::thread;
use std::time::{Duration, Instant};

use glitchrig_frame::{Frame, FrameLink};
use glitchrig_transport::Transport;
use tracing::{debug, trace};

/// Poll `link` until `pick` accepts a frame or `timeout` elapses.
///
/// Frames `pick` rejects are dropped. Returns `None` on timeout.
pub fn wait_for<T, R, F>(
    link: &mut FrameLink<T>,
    timeout: Duration,
    poll_interval: Duration,
    mut pick: F,
) -> Option<R>
where
    T: Transport,
    F: FnMut(&Frame) -> Option<R>,
{
    let deadline = Instant::now() + timeout;
    loop {
        match link.poll() {
            Ok(frames) => {
                for frame in &frames {
                    if let Some(found) = pick(frame) {
                        return Some(found);
                    }
                    trace!(msg_type = %frame.msg_type, "ignoring frame");
                }
            }
            Err(err) => debug!(error = %err, "read failed while waiting; treating as no data"),
        }

        let now = Instant::now();
        if now >= deadline {
            return None;
        }
        thread::sleep(poll_interval.min(deadline - now));
    }
}
