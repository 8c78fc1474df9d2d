//! Empty library target. The scenario tests live under tests/.
