use super::Accumulator;

/// Fold a normalized path into `acc`.
///
/// `path` must already be absolute and free of `.`/`..` segments; it is hashed
/// exactly as given. Case is folded only when the cache is not portable and
/// the filesystem compares names case-insensitively.
pub fn hash_path(path: &str, acc: &mut Accumulator, portable: bool, case_sensitive_fs: bool) {
    if path.is_empty() {
        acc.put_u32(0);
        return;
    }

    let mut count: u32 = 0;
    if portable || case_sensitive_fs {
        for c in path.chars() {
            acc.put_char(c);
            count = count.wrapping_add(1);
        }
    } else {
        for c in path.chars() {
            acc.put_char(fold_char(c));
            count = count.wrapping_add(1);
        }
    }

    acc.put_u32(count);
}

/// One-to-one lowercase mapping of a single char.
///
/// Chars whose lowercase form expands to several chars are kept as they are,
/// so folding never changes the char count of a path.
pub fn fold_char(c: char) -> char {
    if c.is_ascii() {
        return c.to_ascii_lowercase();
    }

    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        _ => c,
    }
}

/// Case policy for path fingerprints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathPolicy {
    pub portable: bool,
    pub case_sensitive_fs: bool,
}

impl PathPolicy {
    pub fn new(portable: bool, case_sensitive_fs: bool) -> Self {
        Self {
            portable,
            case_sensitive_fs,
        }
    }

    /// Policy for the host filesystem
    pub fn for_host(portable: bool) -> Self {
        Self::new(portable, host_is_case_sensitive())
    }

    pub fn folds_case(&self) -> bool {
        !self.portable && !self.case_sensitive_fs
    }

    pub fn hash_into(&self, path: &str, acc: &mut Accumulator) {
        hash_path(path, acc, self.portable, self.case_sensitive_fs);
    }

    /// Fingerprint `path` on its own
    pub fn fingerprint(&self, path: &str) -> u64 {
        let mut acc = Accumulator::new();
        self.hash_into(path, &mut acc);
        acc.finish()
    }
}

/// Whether the host platform's default filesystem compares names by case
pub fn host_is_case_sensitive() -> bool {
    !cfg!(any(target_os = "windows", target_os = "macos", target_os = "ios"))
}
