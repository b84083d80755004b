use crate::models::{Notification, User};

/// Whether `n` is addressed to `user`.
///
/// Stage targeting needs both stage and level to match; a stage-only
/// notification reaches nobody through that rule. Broadcast ignores
/// `target_level`.
pub fn is_visible(user: &User, n: &Notification) -> bool {
    let to_user = n.target_user_id == Some(user.id);
    let to_role = n.target_role == Some(user.role);
    let to_grade = matches!(
        (&n.target_stage, &n.target_level, &user.stage, &user.level),
        (Some(ts), Some(tl), Some(us), Some(ul)) if ts == us && tl == ul
    );
    let broadcast =
        n.target_user_id.is_none() && n.target_role.is_none() && n.target_stage.is_none();

    to_user || to_role || to_grade || broadcast
}

/// Notifications visible to `user`, newest first. Read ones are included.
pub fn visible_for(user: &User, all: &[Notification]) -> Vec<Notification> {
    let mut out: Vec<Notification> = all.iter().filter(|n| is_visible(user, n)).cloned().collect();
    out.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    out
}
