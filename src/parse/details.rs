//! Trail detail page statistics
//!
//! The detail page lists statistics as a definition list:
//!
//! ```html
//! <section id="trail-data">
//!   <dl class="data-items">
//!     <div class="d-item"><dt>Distancia</dt><dd>10.5 km</dd></div>
//!     <div class="d-item"><dt>TrailRank</dt><dd><span>85</span> <span>4.6</span></dd></div>
//!   </dl>
//! </section>
//! ```

use super::{element_text, selector};
use crate::error::Result;
use crate::trail::{Difficulty, TrailStats};
use scraper::Html;

const STATS_ITEM: &str = "section#trail-data dl.data-items .d-item";
const DIFFICULTY_LABEL: &str = "Dificultad técnica";

/// Extract the statistics block of a trail detail page
///
/// A page without the block yields empty stats.
pub fn extract_trail_stats(html: &str) -> Result<TrailStats> {
    let item_sel = selector(STATS_ITEM)?;
    let dt_sel = selector("dt")?;
    let dd_sel = selector("dd")?;
    let span_sel = selector("span")?;

    let document = Html::parse_document(html);
    let mut stats = TrailStats::default();

    for item in document.select(&item_sel) {
        let (Some(dt), Some(dd)) = (item.select(&dt_sel).next(), item.select(&dd_sel).next())
        else {
            continue;
        };

        let label = element_text(dt);
        if label.is_empty() {
            continue;
        }

        // TrailRank's dd carries the rank plus rating widgets; only the first span is the rank
        let value = if label.contains("TrailRank") {
            dd.select(&span_sel).next().map(element_text).unwrap_or_default()
        } else {
            element_text(dd)
        };

        stats.entries.insert(label, value);
    }

    stats.difficulty = stats.get(DIFFICULTY_LABEL).and_then(Difficulty::from_label);
    Ok(stats)
}
