/// Number of page buttons shown between Prev and Next.
pub const WINDOW_SIZE: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ordering {
    Latest,
}

impl Ordering {
    pub fn as_str(self) -> &'static str {
        match self {
            Ordering::Latest => "latest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: u32,
    pub ordering: Option<Ordering>,
}

impl PageRequest {
    pub fn first(ordering: Option<Ordering>) -> Self {
        Self { page: 1, ordering }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![("page", self.page.max(1).to_string())];
        if let Some(order) = self.ordering {
            out.push(("order", order.as_str().to_string()));
        }
        out
    }
}

/// Page numbers to render, centred on `current` and clamped to `[1, total]`.
pub fn page_window(current: u32, total: u32, size: u32) -> Vec<u32> {
    let total = total.max(1);
    let size = size.max(1);
    let current = current.clamp(1, total);
    let mut start = current.saturating_sub(size / 2).max(1);
    let end = start.saturating_add(size - 1).min(total);
    if end - start + 1 < size {
        start = end.saturating_sub(size - 1).max(1);
    }
    (start..=end).collect()
}

/// Returns `Some(target)` when `target` is a page the user may navigate to.
pub fn checked_target(target: u32, total: u32) -> Option<u32> {
    (target >= 1 && target <= total.max(1)).then_some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_totals_show_every_page() {
        assert_eq!(page_window(1, 3, WINDOW_SIZE), vec![1, 2, 3]);
        assert_eq!(page_window(3, 3, WINDOW_SIZE), vec![1, 2, 3]);
        assert_eq!(page_window(1, 1, WINDOW_SIZE), vec![1]);
    }

    #[test]
    fn middle_pages_are_centred() {
        assert_eq!(page_window(10, 20, WINDOW_SIZE), vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn last_page_keeps_a_full_window() {
        assert_eq!(page_window(20, 20, WINDOW_SIZE), vec![16, 17, 18, 19, 20]);
        assert_eq!(page_window(19, 20, WINDOW_SIZE), vec![16, 17, 18, 19, 20]);
    }

    #[test]
    fn stale_current_page_is_clamped() {
        assert_eq!(page_window(40, 20, WINDOW_SIZE), vec![16, 17, 18, 19, 20]);
        assert_eq!(page_window(0, 0, WINDOW_SIZE), vec![1]);
    }

    #[test]
    fn window_is_contiguous_bounded_and_contains_current() {
        for total in 1..=30u32 {
            for current in 1..=total {
                let window = page_window(current, total, WINDOW_SIZE);
                assert!(!window.is_empty());
                assert!(window.len() as u32 <= WINDOW_SIZE);
                assert!(window.windows(2).all(|w| w[1] == w[0] + 1));
                assert!(window[0] >= 1 && *window.last().unwrap() <= total);
                assert!(window.contains(&current), "current={current} total={total}");
            }
        }
    }

    #[test]
    fn huge_page_counts_do_not_overflow() {
        let max = u32::MAX;
        let tail = vec![max - 4, max - 3, max - 2, max - 1, max];
        assert_eq!(page_window(max, max, WINDOW_SIZE), tail);
        assert_eq!(page_window(max - 1, max, WINDOW_SIZE), tail);
        assert_eq!(page_window(1, max, WINDOW_SIZE), vec![1, 2, 3, 4, 5]);
        for current in (max - 10)..=max {
            let window = page_window(current, max, WINDOW_SIZE);
            assert_eq!(window.len() as u32, WINDOW_SIZE);
            assert!(window.contains(&current));
        }
    }

    #[test]
    fn out_of_range_targets_are_rejected() {
        assert_eq!(checked_target(0, 5), None);
        assert_eq!(checked_target(6, 5), None);
        assert_eq!(checked_target(5, 5), Some(5));
    }

    #[test]
    fn query_includes_order_when_set() {
        let req = PageRequest { page: 3, ordering: Some(Ordering::Latest) };
        assert_eq!(
            req.query(),
            vec![("page", "3".to_string()), ("order", "latest".to_string())]
        );
        assert_eq!(PageRequest::first(None).query(), vec![("page", "1".to_string())]);
    }
}
