/// Internals used by all of our interners.
/// Strings are stored back-to-back in one buffer;
/// `starts[k]` is the offset where string `k` begins.
#[derive(Debug, Default)]
pub struct KeyToStr {
    starts: Vec<usize>,
    strings: String,
}

impl KeyToStr {
    pub fn with_capacity_and_avg_len(cap: usize, avg_len: usize) -> Self {
        Self {
            starts: Vec::with_capacity(cap),
            strings: String::with_capacity(cap * avg_len),
        }
    }

    /// Get the string with key `k`.
    /// Keys are only ever handed out by `push`, so `k` is always in bounds.
    pub fn get(&self, k: usize) -> &str {
        let start = self.starts[k];
        let end = self
            .starts
            .get(k + 1)
            .copied()
            .unwrap_or(self.strings.len());
        &self.strings[start..end]
    }

    /// Append `s` without checking for duplicates, returning its key.
    pub fn push(&mut self, s: &str) -> usize {
        let k = self.starts.len();
        self.starts.push(self.strings.len());
        self.strings.push_str(s);
        k
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn str_len(&self) -> usize {
        self.strings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::KeyToStr;

    #[test]
    fn test_push_and_get() {
        let mut strs = KeyToStr::with_capacity_and_avg_len(4, 8);
        let a = strs.push("org.vistrails.basic");
        let b = strs.push("");
        let c = strs.push("org.vistrails.vtk");
        assert_eq!(strs.get(a), "org.vistrails.basic");
        assert_eq!(strs.get(b), "");
        assert_eq!(strs.get(c), "org.vistrails.vtk");
        assert_eq!(strs.len(), 3);
        assert_eq!(strs.str_len(), 36);
    }
}
