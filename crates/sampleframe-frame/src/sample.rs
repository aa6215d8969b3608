use crate::format::FrameFormat;

/// Decoded samples of one frame, organised per channel.
///
/// Every value is widened to `f64` regardless of its wire encoding. A frame
/// may carry several sample sets, so each channel holds `num_samples` values.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePack {
    num_samples: usize,
    data: Vec<Vec<f64>>,
    placeholders: Vec<bool>,
}

impl SamplePack {
    /// A zero-filled pack.
    pub fn new(num_channels: usize, num_samples: usize) -> Self {
        Self {
            num_samples,
            data: vec![vec![0.0; num_samples]; num_channels],
            placeholders: vec![false; num_channels],
        }
    }

    /// A zero-filled pack shaped for `format`, with pad channels marked as placeholders.
    pub fn for_format(format: &FrameFormat, num_samples: usize) -> Self {
        let mut pack = Self::new(format.num_channels(), num_samples);
        for (slot, channel) in pack.placeholders.iter_mut().zip(&format.channels) {
            *slot = channel.is_pad();
        }
        pack
    }

    pub fn num_channels(&self) -> usize {
        self.data.len()
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Values of one channel, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn channel(&self, channel: usize) -> &[f64] {
        &self.data[channel]
    }

    pub fn channel_mut(&mut self, channel: usize) -> &mut [f64] {
        &mut self.data[channel]
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f64]> {
        self.data.iter().map(Vec::as_slice)
    }

    /// True for channels that only exist to skip raw bytes.
    pub fn is_placeholder(&self, channel: usize) -> bool {
        self.placeholders.get(channel).copied().unwrap_or(false)
    }

    /// The `index`-th value of every channel.
    pub fn sample_set(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().filter_map(move |values| values.get(index).copied())
    }

    pub fn into_channels(self) -> Vec<Vec<f64>> {
        self.data
    }
}
