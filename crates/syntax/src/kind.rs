/// Numeric tag of a node or token, assigned by the host language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyntaxKind(pub u16);

impl SyntaxKind {
	#[inline]
	pub const fn new(raw: u16) -> Self {
		Self(raw)
	}

	#[inline]
	pub const fn as_u16(self) -> u16 {
		self.0
	}
}

impl From<u16> for SyntaxKind {
	fn from(raw: u16) -> Self {
		Self(raw)
	}
}

impl std::fmt::Display for SyntaxKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "SyntaxKind({})", self.0)
	}
}
