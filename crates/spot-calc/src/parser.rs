use crate::error::CalcError;

/// Nesting limit for parentheses. Deeper input is rejected instead of
/// growing the call stack without bound. `^` chains do not count.
pub const MAX_NESTING: usize = 512;

/// Recursive descent parser over an already validated expression.
///
/// The cursor lives in the parser value itself, so every `evaluate` call gets
/// a fresh one and nothing leaks between calls.
#[derive(Debug)]
pub struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// `input` must be whitespace free and contain only `0-9 + - * / . ( ) % ^`.
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    /// Parses a single expression from the start of the input.
    ///
    /// Whatever is left after the top level expression is ignored, so `2)3`
    /// evaluates to `2`.
    pub fn parse(mut self) -> Result<f64, CalcError> {
        self.expression()
    }

    /// Current cursor position, mostly useful for error reporting.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    #[inline]
    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn enter(&mut self) -> Result<(), CalcError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(CalcError::NestingTooDeep {
                position: self.pos,
            });
        }
        Ok(())
    }

    #[inline]
    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn expression(&mut self) -> Result<f64, CalcError> {
        self.enter()?;
        let value = self.add_sub();
        self.leave();
        value
    }

    fn add_sub(&mut self) -> Result<f64, CalcError> {
        let mut left = self.mul_div()?;

        while let Some(op @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let right = self.mul_div()?;
            left = if op == b'+' { left + right } else { left - right };
        }

        Ok(left)
    }

    fn mul_div(&mut self) -> Result<f64, CalcError> {
        let mut left = self.power()?;

        while let Some(op @ (b'*' | b'/' | b'%')) = self.peek() {
            self.pos += 1;
            let right = self.power()?;
            left = match op {
                b'*' => left * right,
                b'/' => left / right,
                // fmod semantics, the sign follows the dividend
                _ => left % right,
            };
        }

        Ok(left)
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.unary()?;
        if self.peek() != Some(b'^') {
            return Ok(base);
        }

        let mut exponents = Vec::new();
        while self.eat(b'^') {
            exponents.push(self.unary()?);
        }

        // right associative: fold from the last exponent backwards
        let exponent = exponents
            .into_iter()
            .rev()
            .reduce(|acc, lower| lower.powf(acc));
        Ok(exponent.map_or(base, |exponent| base.powf(exponent)))
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.eat(b'-') {
            return Ok(-self.atom()?);
        }
        self.eat(b'+');
        self.atom()
    }

    fn atom(&mut self) -> Result<f64, CalcError> {
        if self.eat(b'(') {
            let value = self.expression()?;
            // a missing closing paren is tolerated
            self.eat(b')');
            return Ok(value);
        }

        self.number()
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        while let Some(b'0'..=b'9' | b'.') = self.peek() {
            self.pos += 1;
        }

        parse_number_prefix(&self.input[start..self.pos])
            .ok_or(CalcError::InvalidNumber { position: start })
    }
}

/// Parses the longest `digits ('.' digits)?` prefix of a run of digits and dots.
///
/// `1.2.3` yields `1.2`, `.5` yields `0.5`, `5.` yields `5`. A run with no
/// digit before the second dot yields `None`.
fn parse_number_prefix(run: &[u8]) -> Option<f64> {
    let int_len = run.iter().take_while(|b| b.is_ascii_digit()).count();
    let mut end = int_len;
    let mut frac_len = 0;

    if run.get(end) == Some(&b'.') {
        frac_len = run[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        end += 1 + frac_len;
    }

    if int_len == 0 && frac_len == 0 {
        return None;
    }

    // the prefix is pure ascii digits and at most one dot
    std::str::from_utf8(&run[..end]).ok()?.parse().ok()
}
