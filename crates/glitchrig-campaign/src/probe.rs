//! Out-of-campaign rig queries.

use std::time::{Duration, Instant};

use glitchrig_frame::{decode_json_object, FrameLink, MessageType};
use glitchrig_transport::Transport;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{CampaignError, Result};
use crate::poll::wait_for;

/// Send PING and wait for PONG. Returns the round-trip time.
pub fn ping<T: Transport>(
    link: &mut FrameLink<T>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Duration> {
    link.discard_pending();
    let start = Instant::now();
    link.send(MessageType::Ping, &[])?;

    wait_for(link, timeout, poll_interval, |frame| {
        (frame.msg_type == MessageType::Pong).then_some(())
    })
    .ok_or(CampaignError::Timeout(timeout))?;

    let rtt = start.elapsed();
    debug!(rtt_us = rtt.as_micros() as u64, "pong");
    Ok(rtt)
}

/// Send a capability query and return the rig's first JSON object reply.
pub fn capabilities<T: Transport>(
    link: &mut FrameLink<T>,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Map<String, Value>> {
    link.discard_pending();
    link.send(MessageType::CapabilityQuery, &[])?;

    wait_for(link, timeout, poll_interval, |frame| {
        decode_json_object(&frame.payload)
    })
    .ok_or(CampaignError::Timeout(timeout))
}

#[cfg(test)]
mod tests {
    use glitchrig_frame::encode;
    use glitchrig_transport::MemoryTransport;

    use super::*;

    const SHORT: Duration = Duration::from_millis(20);
    const TICK: Duration = Duration::from_millis(1);

    fn link_with(reply: &[u8]) -> FrameLink<MemoryTransport> {
        let mut t = MemoryTransport::new();
        t.open().unwrap();
        t.push_inbound(reply);
        FrameLink::new(t)
    }

    #[test]
    fn ping_answered_by_pong() {
        let mut link = link_with(&encode(MessageType::Pong, b"").unwrap());
        let rtt = ping(&mut link, SHORT, TICK).unwrap();
        assert!(rtt < Duration::from_secs(1));
        assert_eq!(
            link.get_mut().take_outbound(),
            encode(MessageType::Ping, b"").unwrap()
        );
    }

    #[test]
    fn ping_without_pong_times_out() {
        let mut link = link_with(&encode(MessageType::Ack, b"").unwrap());
        let err = ping(&mut link, SHORT, TICK).unwrap_err();
        assert!(matches!(err, CampaignError::Timeout(t) if t == SHORT));
    }

    #[test]
    fn capabilities_returns_object() {
        let reply = encode(
            MessageType::CapabilityQuery,
            br#"{"clock_impl":["COMPRESS","EXTRA_EDGE"],"power":true}"#,
        )
        .unwrap();
        let mut link = link_with(&reply);
        let caps = capabilities(&mut link, SHORT, TICK).unwrap();
        assert_eq!(caps["power"], Value::Bool(true));
    }

    #[test]
    fn probe_on_closed_transport_fails_fast() {
        let mut link = FrameLink::new(MemoryTransport::new());
        let err = ping(&mut link, SHORT, TICK).unwrap_err();
        assert!(matches!(err, CampaignError::Frame(_)));
    }
}
