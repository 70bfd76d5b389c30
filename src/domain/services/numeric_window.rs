use std::collections::VecDeque;

/// Fixed-capacity ring buffer of samples with O(1) append and running
/// mean / population variance.
///
/// Once `capacity` samples are stored, each push evicts the oldest one.
/// Statistics over an empty window are reported as zero; callers check
/// `len()` against their own minimum before trusting them.
///
/// Running sums are taken relative to a stored sample (`shift`), so the
/// variance stays accurate when values are large relative to their spread.
#[derive(Debug, Clone)]
pub struct NumericWindow {
    capacity: usize,
    samples: VecDeque<f64>,
    shift: f64,
    sum: f64,
    sum_sq: f64,
    /// Length of the run of identical values at the back of the window
    equal_run: usize,
    /// Pushes since the running sums were last rebuilt from the samples
    pushes_since_resync: usize,
}

impl NumericWindow {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "NumericWindow capacity must be non-zero");
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            shift: 0.0,
            sum: 0.0,
            sum_sq: 0.0,
            equal_run: 0,
            pushes_since_resync: 0,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.samples.is_empty() {
            self.shift = value;
            self.sum = 0.0;
            self.sum_sq = 0.0;
        }

        if self.samples.len() == self.capacity {
            if let Some(evicted) = self.samples.pop_front() {
                let d = evicted - self.shift;
                self.sum -= d;
                self.sum_sq -= d * d;
            }
        }

        match self.samples.back() {
            Some(last) if *last == value => self.equal_run += 1,
            _ => self.equal_run = 1,
        }

        self.samples.push_back(value);
        let d = value - self.shift;
        self.sum += d;
        self.sum_sq += d * d;

        // Rebuild once per full rotation so add/subtract drift cannot accumulate
        self.pushes_since_resync += 1;
        if self.pushes_since_resync >= self.capacity {
            self.resync();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.shift + self.sum / self.samples.len() as f64
    }

    /// Population variance (divides by n, not n - 1); exactly zero when all
    /// stored samples are equal
    pub fn variance(&self) -> f64 {
        if self.samples.is_empty() || self.equal_run >= self.samples.len() {
            return 0.0;
        }

        let n = self.samples.len() as f64;
        let variance = (self.sum_sq - self.sum * self.sum / n) / n;
        if variance <= 0.0 {
            0.0
        } else {
            variance
        }
    }

    /// Population standard deviation
    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Stored samples, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.samples.iter()
    }

    fn resync(&mut self) {
        self.shift = self.samples.front().copied().unwrap_or(0.0);
        let shift = self.shift;
        self.sum = self.samples.iter().map(|v| v - shift).sum();
        self.sum_sq = self.samples.iter().map(|v| (v - shift) * (v - shift)).sum();
        self.pushes_since_resync = 0;
    }
}
