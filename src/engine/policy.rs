use crate::model::*;

/// Does the property's declared offering window admit the requested dates?
///
/// Only sides present on both the declaration and the request are compared:
/// a declared start after the check-in rejects, as does a declared end
/// before the check-out. An open side constrains nothing.
pub fn declared_window_admits(declared: &DeclaredWindow, requested: &RequestedDates) -> bool {
    if let (Some(start), Some(check_in)) = (declared.start_of_availability, requested.check_in)
        && start > check_in {
            return false;
        }
    if let (Some(end), Some(check_out)) = (declared.end_of_availability, requested.check_out)
        && end < check_out {
            return false;
        }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(m: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2025, m, day)
    }

    fn declared(start: Option<NaiveDate>, end: Option<NaiveDate>) -> DeclaredWindow {
        DeclaredWindow {
            start_of_availability: start,
            end_of_availability: end,
        }
    }

    #[test]
    fn both_bounds_contain_request() {
        let w = declared(d(1, 1), d(1, 10));
        assert!(declared_window_admits(&w, &RequestedDates::new(d(1, 5), d(1, 8))));
        assert!(declared_window_admits(&w, &RequestedDates::new(d(1, 1), d(1, 10))));
    }

    #[test]
    fn both_bounds_reject_overhang() {
        let w = declared(d(1, 1), d(1, 10));
        assert!(!declared_window_admits(&w, &RequestedDates::new(d(1, 9), d(1, 15))));
        let new_year_eve = NaiveDate::from_ymd_opt(2024, 12, 31);
        assert!(!declared_window_admits(&w, &RequestedDates::new(new_year_eve, d(1, 3))));
    }

    #[test]
    fn start_only() {
        let w = declared(d(2, 1), None);
        assert!(!declared_window_admits(&w, &RequestedDates::new(d(1, 20), d(2, 5))));
        assert!(declared_window_admits(&w, &RequestedDates::new(d(2, 1), d(12, 31))));
    }

    #[test]
    fn end_only() {
        let w = declared(None, d(2, 1));
        assert!(declared_window_admits(&w, &RequestedDates::new(d(1, 1), d(2, 1))));
        assert!(!declared_window_admits(&w, &RequestedDates::new(d(1, 30), d(2, 2))));
    }

    #[test]
    fn open_declaration_admits_everything() {
        let w = DeclaredWindow::default();
        assert!(declared_window_admits(&w, &RequestedDates::new(d(1, 1), d(12, 31))));
    }

    #[test]
    fn partial_request_checks_only_its_side() {
        let w = declared(d(3, 1), d(3, 31));
        assert!(!declared_window_admits(&w, &RequestedDates::new(d(2, 1), None)));
        assert!(declared_window_admits(&w, &RequestedDates::new(None, d(3, 20))));
        assert!(declared_window_admits(&w, &RequestedDates::default()));
    }
}
