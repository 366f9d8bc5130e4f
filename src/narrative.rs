/// Produces the chief's end-of-shift verdict for a finished run.
///
/// Drivers call this off the game loop and hand the result back together
/// with the episode token it was requested for, so slow generators can
/// never write into a newer run.
pub trait NarrativeService {
    fn generate_end_message(&self, score: i32) -> String;
}

/// Built-in deterministic verdict. Keeps the chief's register: harsh below
/// 500 points, grudging up to 1500, stern praise above that.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChiefReport;

impl NarrativeService for ChiefReport {
    fn generate_end_message(&self, score: i32) -> String {
        if score < 500 {
            format!(
                "Chief's report: {score} points. An absolute disaster. \
                 Turn in your badge and your flashlight on the way out."
            )
        } else if score <= 1_500 {
            format!(
                "Chief's report: {score} points. Barely acceptable. \
                 The premiere survived, no thanks to your footwork."
            )
        } else {
            format!(
                "Chief's report: {score} points. Not bad, rookie. \
                 Don't let it go to your head. Same shift tomorrow."
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChiefReport, NarrativeService};

    #[test]
    fn low_scores_get_the_harsh_verdict() {
        let report = ChiefReport.generate_end_message(0);
        assert!(report.contains("Turn in your badge"));
        assert!(ChiefReport
            .generate_end_message(499)
            .contains("Turn in your badge"));
    }

    #[test]
    fn middle_scores_get_grudging_acknowledgement() {
        assert!(ChiefReport
            .generate_end_message(500)
            .contains("Barely acceptable"));
        assert!(ChiefReport
            .generate_end_message(1_500)
            .contains("Barely acceptable"));
    }

    #[test]
    fn high_scores_get_stern_praise() {
        assert!(ChiefReport
            .generate_end_message(1_501)
            .contains("Not bad, rookie"));
    }

    #[test]
    fn verdict_includes_the_final_score() {
        assert!(ChiefReport.generate_end_message(1_234).contains("1234"));
    }
}
