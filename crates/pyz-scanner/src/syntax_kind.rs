/// Token kinds produced by the scanner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    EndOfFile,
    Newline,
    Indent,
    Dedent,
    Unknown,

    Name,
    Int,
    Float,
    Complex,
    String,
    Bytes,

    // Keywords
    FalseKeyword,
    NoneKeyword,
    TrueKeyword,
    AndKeyword,
    AsKeyword,
    AssertKeyword,
    AsyncKeyword,
    AwaitKeyword,
    BreakKeyword,
    ClassKeyword,
    ContinueKeyword,
    DefKeyword,
    DelKeyword,
    ElifKeyword,
    ElseKeyword,
    ExceptKeyword,
    FinallyKeyword,
    ForKeyword,
    FromKeyword,
    GlobalKeyword,
    IfKeyword,
    ImportKeyword,
    InKeyword,
    IsKeyword,
    LambdaKeyword,
    NonlocalKeyword,
    NotKeyword,
    OrKeyword,
    PassKeyword,
    RaiseKeyword,
    ReturnKeyword,
    TryKeyword,
    WhileKeyword,
    WithKeyword,
    YieldKeyword,

    // Punctuation
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Colon,
    Comma,
    Semicolon,
    Dot,
    Ellipsis,
    Arrow,
    At,
    Equals,
    ColonEquals,

    // Operators
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Pipe,
    Ampersand,
    Caret,
    Tilde,
    LeftShift,
    RightShift,
    Less,
    Greater,
    LessEquals,
    GreaterEquals,
    EqualsEquals,
    NotEquals,

    // Augmented assignment
    PlusEquals,
    MinusEquals,
    StarEquals,
    DoubleStarEquals,
    SlashEquals,
    DoubleSlashEquals,
    PercentEquals,
    PipeEquals,
    AmpersandEquals,
    CaretEquals,
    LeftShiftEquals,
    RightShiftEquals,
    AtEquals,
}

impl SyntaxKind {
    pub fn keyword(text: &str) -> Option<SyntaxKind> {
        use SyntaxKind::*;
        Some(match text {
            "False" => FalseKeyword,
            "None" => NoneKeyword,
            "True" => TrueKeyword,
            "and" => AndKeyword,
            "as" => AsKeyword,
            "assert" => AssertKeyword,
            "async" => AsyncKeyword,
            "await" => AwaitKeyword,
            "break" => BreakKeyword,
            "class" => ClassKeyword,
            "continue" => ContinueKeyword,
            "def" => DefKeyword,
            "del" => DelKeyword,
            "elif" => ElifKeyword,
            "else" => ElseKeyword,
            "except" => ExceptKeyword,
            "finally" => FinallyKeyword,
            "for" => ForKeyword,
            "from" => FromKeyword,
            "global" => GlobalKeyword,
            "if" => IfKeyword,
            "import" => ImportKeyword,
            "in" => InKeyword,
            "is" => IsKeyword,
            "lambda" => LambdaKeyword,
            "nonlocal" => NonlocalKeyword,
            "not" => NotKeyword,
            "or" => OrKeyword,
            "pass" => PassKeyword,
            "raise" => RaiseKeyword,
            "return" => ReturnKeyword,
            "try" => TryKeyword,
            "while" => WhileKeyword,
            "with" => WithKeyword,
            "yield" => YieldKeyword,
            _ => return None,
        })
    }

    pub fn is_keyword(self) -> bool {
        (self as u16) >= (SyntaxKind::FalseKeyword as u16)
            && (self as u16) <= (SyntaxKind::YieldKeyword as u16)
    }

    /// Augmented assignment operators, mapped to their binary operator.
    pub fn augmented_operator(self) -> Option<SyntaxKind> {
        use SyntaxKind::*;
        Some(match self {
            PlusEquals => Plus,
            MinusEquals => Minus,
            StarEquals => Star,
            DoubleStarEquals => DoubleStar,
            SlashEquals => Slash,
            DoubleSlashEquals => DoubleSlash,
            PercentEquals => Percent,
            PipeEquals => Pipe,
            AmpersandEquals => Ampersand,
            CaretEquals => Caret,
            LeftShiftEquals => LeftShift,
            RightShiftEquals => RightShift,
            AtEquals => At,
            _ => return None,
        })
    }

    /// Source spelling for operators and punctuation; used in diagnostics.
    pub fn text(self) -> &'static str {
        use SyntaxKind::*;
        match self {
            EndOfFile => "<eof>",
            Newline => "<newline>",
            Indent => "<indent>",
            Dedent => "<dedent>",
            Unknown => "<unknown>",
            Name => "<name>",
            Int | Float | Complex => "<number>",
            String | Bytes => "<string>",
            FalseKeyword => "False",
            NoneKeyword => "None",
            TrueKeyword => "True",
            AndKeyword => "and",
            AsKeyword => "as",
            AssertKeyword => "assert",
            AsyncKeyword => "async",
            AwaitKeyword => "await",
            BreakKeyword => "break",
            ClassKeyword => "class",
            ContinueKeyword => "continue",
            DefKeyword => "def",
            DelKeyword => "del",
            ElifKeyword => "elif",
            ElseKeyword => "else",
            ExceptKeyword => "except",
            FinallyKeyword => "finally",
            ForKeyword => "for",
            FromKeyword => "from",
            GlobalKeyword => "global",
            IfKeyword => "if",
            ImportKeyword => "import",
            InKeyword => "in",
            IsKeyword => "is",
            LambdaKeyword => "lambda",
            NonlocalKeyword => "nonlocal",
            NotKeyword => "not",
            OrKeyword => "or",
            PassKeyword => "pass",
            RaiseKeyword => "raise",
            ReturnKeyword => "return",
            TryKeyword => "try",
            WhileKeyword => "while",
            WithKeyword => "with",
            YieldKeyword => "yield",
            OpenParen => "(",
            CloseParen => ")",
            OpenBracket => "[",
            CloseBracket => "]",
            OpenBrace => "{",
            CloseBrace => "}",
            Colon => ":",
            Comma => ",",
            Semicolon => ";",
            Dot => ".",
            Ellipsis => "...",
            Arrow => "->",
            At => "@",
            Equals => "=",
            ColonEquals => ":=",
            Plus => "+",
            Minus => "-",
            Star => "*",
            DoubleStar => "**",
            Slash => "/",
            DoubleSlash => "//",
            Percent => "%",
            Pipe => "|",
            Ampersand => "&",
            Caret => "^",
            Tilde => "~",
            LeftShift => "<<",
            RightShift => ">>",
            Less => "<",
            Greater => ">",
            LessEquals => "<=",
            GreaterEquals => ">=",
            EqualsEquals => "==",
            NotEquals => "!=",
            PlusEquals => "+=",
            MinusEquals => "-=",
            StarEquals => "*=",
            DoubleStarEquals => "**=",
            SlashEquals => "/=",
            DoubleSlashEquals => "//=",
            PercentEquals => "%=",
            PipeEquals => "|=",
            AmpersandEquals => "&=",
            CaretEquals => "^=",
            LeftShiftEquals => "<<=",
            RightShiftEquals => ">>=",
            AtEquals => "@=",
        }
    }
}
