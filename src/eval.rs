//! Confusion-matrix bookkeeping and derived metrics.
//!
//! Counting convention: ground truth 1 means the dataset calls the sentence
//! ungrammatical, prediction 1 means recognition failed. Precision and recall
//! fall back to 0.0 on an empty denominator so a run with no positive
//! predictions still yields a well-formed report.

use serde::Serialize;

/// Four-way tally over (ground_truth, prediction) pairs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Confusion {
    pub tp: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
    pub tn: u64,
}

impl Confusion {
    pub fn new() -> Confusion {
        Confusion::default()
    }

    /// Count one row. Any nonzero label is treated as 1.
    pub fn accumulate(&mut self, ground_truth: u8, prediction: u8) {
        match (ground_truth != 0, prediction != 0) {
            (true, true) => self.tp += 1,
            (false, true) => self.fp += 1,
            (true, false) => self.fn_ += 1,
            (false, false) => self.tn += 1,
        }
    }

    /// Fold another tally into this one. Workers compute private partials
    /// and the driver merges them after the fact, so no locking is needed.
    pub fn merge(&mut self, other: Confusion) {
        self.tp += other.tp;
        self.fp += other.fp;
        self.fn_ += other.fn_;
        self.tn += other.tn;
    }

    pub fn precision(&self) -> f64 {
        safe_ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        safe_ratio(self.tp, self.tp + self.fn_)
    }

    pub fn precision_recall(&self) -> (f64, f64) {
        (self.precision(), self.recall())
    }

    /// Human-readable report, one line of counts plus the two ratios.
    pub fn summary(&self) -> String {
        let (prec, rec) = self.precision_recall();
        format!(
            "Evaluation (Grammar Checker)\n\
             ----------------------------\n\
             TP: {}   FP: {}   FN: {}   TN: {}\n\
             Precision: {:.4}\n\
             Recall:    {:.4}",
            self.tp, self.fp, self.fn_, self.tn, prec, rec
        )
    }
}

fn safe_ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Machine-readable metrics record for the JSON report.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Metrics {
    pub tp: u64,
    pub fp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
    pub tn: u64,
    pub precision: f64,
    pub recall: f64,
}

impl From<&Confusion> for Metrics {
    fn from(conf: &Confusion) -> Metrics {
        let (precision, recall) = conf.precision_recall();
        Metrics {
            tp: conf.tp,
            fp: conf.fp,
            fn_: conf.fn_,
            tn: conf.tn,
            precision,
            recall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_cell_increments_once() {
        let mut conf = Confusion::new();
        conf.accumulate(1, 1);
        conf.accumulate(0, 1);
        conf.accumulate(1, 0);
        conf.accumulate(0, 0);
        assert_eq!(
            conf,
            Confusion { tp: 1, fp: 1, fn_: 1, tn: 1 }
        );
    }

    #[test]
    fn counting_is_order_independent() {
        let pairs = [(1, 1), (0, 0), (0, 1), (1, 0), (1, 1), (0, 0)];
        let mut forward = Confusion::new();
        for &(gt, pred) in &pairs {
            forward.accumulate(gt, pred);
        }
        let mut backward = Confusion::new();
        for &(gt, pred) in pairs.iter().rev() {
            backward.accumulate(gt, pred);
        }
        assert_eq!(forward, backward);
    }

    #[test]
    fn merge_matches_sequential_accumulation() {
        let pairs = [(1, 1), (0, 1), (1, 0), (0, 0), (1, 1)];
        let mut whole = Confusion::new();
        for &(gt, pred) in &pairs {
            whole.accumulate(gt, pred);
        }
        let (left, right) = pairs.split_at(2);
        let mut a = Confusion::new();
        for &(gt, pred) in left {
            a.accumulate(gt, pred);
        }
        let mut b = Confusion::new();
        for &(gt, pred) in right {
            b.accumulate(gt, pred);
        }
        a.merge(b);
        assert_eq!(a, whole);
    }

    #[test]
    fn zero_denominators_yield_zero_not_nan() {
        let conf = Confusion::new();
        let (prec, rec) = conf.precision_recall();
        assert_eq!((prec, rec), (0.0, 0.0));

        // tn-only run: still (0.0, 0.0)
        let mut conf = Confusion::new();
        conf.accumulate(0, 0);
        assert_eq!(conf.precision_recall(), (0.0, 0.0));
    }

    #[test]
    fn standard_ratios() {
        let conf = Confusion { tp: 1, fp: 1, fn_: 0, tn: 1 };
        assert_eq!(conf.precision(), 0.5);
        assert_eq!(conf.recall(), 1.0);
    }

    #[test]
    fn summary_formats_four_decimal_places() {
        let conf = Confusion { tp: 1, fp: 2, fn_: 0, tn: 0 };
        let text = conf.summary();
        assert!(text.starts_with("Evaluation (Grammar Checker)"));
        assert!(text.contains("TP: 1   FP: 2   FN: 0   TN: 0"));
        assert!(text.contains("Precision: 0.3333"));
        assert!(text.contains("Recall:    1.0000"));
    }

    #[test]
    fn metrics_record_serializes_with_fn_field() {
        let conf = Confusion { tp: 1, fp: 1, fn_: 0, tn: 1 };
        let json = serde_json::to_value(Metrics::from(&conf)).unwrap();
        assert_eq!(json["tp"], 1);
        assert_eq!(json["fn"], 0);
        assert_eq!(json["precision"], 0.5);
        assert_eq!(json["recall"], 1.0);
    }
}
