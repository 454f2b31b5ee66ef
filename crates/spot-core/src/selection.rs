/// Keyboard selection over the rendered result list.
///
/// The list changes under the cursor while results stream in, so the index is
/// re-validated against every new snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    index: Option<usize>,
}

impl Selection {
    #[inline]
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Index as the UI sees it, `-1` when nothing is selected.
    #[inline]
    pub fn as_signed(&self) -> isize {
        self.index.map_or(-1, |index| index as isize)
    }

    /// Clamps the index to `[0, count - 1]`, or clears it for an empty list.
    pub fn revalidate(&mut self, count: usize) {
        self.index = match count {
            0 => None,
            _ => Some(self.index.unwrap_or(0).min(count - 1)),
        };
    }

    /// Moves by `delta` rows, staying inside the list.
    pub fn move_by(&mut self, delta: isize, count: usize) {
        if count == 0 {
            self.index = None;
            return;
        }

        let current = self.index.unwrap_or(0) as isize;
        let last = count as isize - 1;
        self.index = Some((current + delta).clamp(0, last) as usize);
    }

    pub fn clear(&mut self) {
        self.index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revalidate() {
        let mut selection = Selection::default();
        assert_eq!(selection.as_signed(), -1);

        selection.revalidate(3);
        assert_eq!(selection.index(), Some(0));

        selection.move_by(5, 3);
        assert_eq!(selection.index(), Some(2));

        // the list shrank under the cursor
        selection.revalidate(2);
        assert_eq!(selection.index(), Some(1));

        selection.revalidate(0);
        assert_eq!(selection.index(), None);
        assert_eq!(selection.as_signed(), -1);
    }

    #[test]
    fn test_move_by_clamps() {
        let mut selection = Selection::default();
        selection.move_by(-1, 4);
        assert_eq!(selection.index(), Some(0));

        selection.move_by(2, 4);
        assert_eq!(selection.index(), Some(2));

        selection.move_by(-10, 4);
        assert_eq!(selection.index(), Some(0));

        selection.move_by(1, 0);
        assert_eq!(selection.index(), None);
    }
}
