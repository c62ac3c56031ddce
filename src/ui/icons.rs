pub struct Icons;

impl Icons {
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const DATABASE: &str = "🗄️";
    pub const GAME: &str = "🎮";
    pub const FOLDER: &str = "📁";
    pub const GLOBE: &str = "🌍";
    pub const GEAR: &str = "⚙️";
}
