use serde::{Deserialize, Serialize};

/// Ordered list of page intervals; each becomes one output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePlan {
    pub total_pages: u32,
    pub ranges: Vec<PageRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub start_page: u32, // 1-based inclusive
    pub end_page: u32,   // 1-based inclusive
}

impl PageRange {
    pub fn single(page: u32) -> Self {
        Self {
            start_page: page,
            end_page: page,
        }
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start_page..=self.end_page
    }
}

/// Whether a raw expression only uses digits, commas, dashes and whitespace.
pub fn is_valid_expression(raw: &str) -> bool {
    raw.trim()
        .chars()
        .all(|c| c.is_ascii_digit() || c == ',' || c == '-' || c.is_whitespace())
}

impl PagePlan {
    /// Every page on its own, ascending.
    pub fn explode(total_pages: u32) -> PagePlan {
        PagePlan {
            total_pages,
            ranges: (1..=total_pages).map(PageRange::single).collect(),
        }
    }

    /// Parses `1-3,5,8-10` style expressions against a known page count.
    ///
    /// Dash ranges are swapped when reversed, clamped to `total_pages`, and expanded into single
    /// pages. Tokens that fall entirely outside the document are dropped. Output order follows
    /// token order.
    pub fn parse(raw: &str, total_pages: u32) -> PagePlan {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::explode(total_pages);
        }

        let mut ranges = Vec::new();

        for part in trimmed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if part.contains('-') {
                let mut bounds = part.split('-').map(str::trim);
                let start = bounds.next().and_then(parse_page);
                let end = bounds.next().and_then(parse_page);
                let (Some(mut start), Some(mut end)) = (start, end) else {
                    continue;
                };
                if start < 1 || end < 1 {
                    continue;
                }
                if start > end {
                    std::mem::swap(&mut start, &mut end);
                }
                if start > total_pages {
                    continue;
                }
                end = end.min(total_pages);
                ranges.extend((start..=end).map(PageRange::single));
            } else {
                let Some(page) = parse_page(part) else {
                    continue;
                };
                if page < 1 || page > total_pages {
                    continue;
                }
                ranges.push(PageRange::single(page));
            }
        }

        PagePlan { total_pages, ranges }
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

fn parse_page(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    s.parse::<u64>().ok().map(|n| n.min(u32::MAX as u64) as u32)
}
