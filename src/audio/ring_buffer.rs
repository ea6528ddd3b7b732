//! Lock-free SPSC ring buffer between the cpal callback thread and the
//! capture loop.

use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
};

/// Default capacity: ~10 seconds of 16 kHz mono audio.
const DEFAULT_CAPACITY: usize = 160_000;

/// Producer half, owned by the cpal input callback.
pub struct AudioProducer {
    inner: ringbuf::HeapProd<f32>,
}

/// Consumer half, owned by the capture loop.
pub struct AudioConsumer {
    inner: ringbuf::HeapCons<f32>,
}

/// Create a matched producer/consumer pair.
pub fn audio_ring_buffer(capacity: Option<usize>) -> (AudioProducer, AudioConsumer) {
    let cap = capacity.unwrap_or(DEFAULT_CAPACITY);
    let rb = HeapRb::<f32>::new(cap);
    let (prod, cons) = rb.split();
    (AudioProducer { inner: prod }, AudioConsumer { inner: cons })
}

impl AudioProducer {
    /// Push samples; returns how many fit. Overflow drops the newest audio.
    pub fn push_slice(&mut self, samples: &[f32]) -> usize {
        self.inner.push_slice(samples)
    }
}

// Safety: each half is used from exactly one thread at a time; the producer
// moves into the cpal callback thread once and never comes back.
unsafe impl Send for AudioProducer {}

impl AudioConsumer {
    /// Number of samples currently buffered.
    pub fn available(&self) -> usize {
        self.inner.occupied_len()
    }

    /// Drain every buffered sample.
    pub fn drain_all(&mut self) -> Vec<f32> {
        let n = self.available();
        if n == 0 {
            return Vec::new();
        }
        let mut buf = vec![0.0f32; n];
        let read = self.inner.pop_slice(&mut buf);
        buf.truncate(read);
        buf
    }
}

unsafe impl Send for AudioConsumer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_returns_pushed_samples_in_order() {
        let (mut prod, mut cons) = audio_ring_buffer(Some(8));
        assert_eq!(prod.push_slice(&[0.1, 0.2, 0.3]), 3);
        assert_eq!(cons.available(), 3);
        assert_eq!(cons.drain_all(), vec![0.1, 0.2, 0.3]);
        assert!(cons.drain_all().is_empty());
    }

    #[test]
    fn test_overflow_is_truncated() {
        let (mut prod, mut cons) = audio_ring_buffer(Some(4));
        assert_eq!(prod.push_slice(&[1.0; 6]), 4);
        assert_eq!(cons.drain_all().len(), 4);
    }
}
