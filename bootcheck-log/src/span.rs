//! Span 跟踪

/// Span ID（唯一标识符）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpanId(pub u64);

/// 一段命名的执行上下文，例如一次 stage 构建
#[derive(Clone, Debug, PartialEq)]
pub struct Span {
    pub id: SpanId,
    /// 通常是操作名
    pub name: &'static str,
}

impl Span {
    pub const fn new(id: SpanId, name: &'static str) -> Self {
        Span { id, name }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_creation() {
        let span = Span::new(SpanId(1), "build_stage");
        assert_eq!(span.id, SpanId(1));
        assert_eq!(span.name, "build_stage");
    }
}
