//! Shared email content templates
//!
//! Canonical content generators for invitation emails, used by both
//! production (SES) and mock email services.

/// Generate plain-text body for a league invitation email.
pub fn league_invitation_text(inviter_name: &str, league_name: &str, invitation_url: &str) -> String {
    format!(
        "Hi there!\n\n\
        {} has invited you to join the league '{}'.\n\n\
        Open Kudos to accept or decline the invitation:\n\
        {}\n\n\
        Thanks,\n\
        The Kudos Team",
        inviter_name, league_name, invitation_url
    )
}

/// Generate styled HTML body for a league invitation email.
pub fn league_invitation_html(inviter_name: &str, league_name: &str, invitation_url: &str) -> String {
    format!(
        r#"
            <html>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #00a884;">You're invited to join {league_name}!</h2>

                    <p>Hi there!</p>

                    <p><strong>{inviter_name}</strong> has invited you to join the league '<strong>{league_name}</strong>'.</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <a href="{invitation_url}"
                           style="background-color: #00a884; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block; font-weight: bold;">
                            View Invitation
                        </a>
                    </div>

                    <p>Or copy and paste this link in your browser:</p>
                    <p style="background-color: #f5f5f5; padding: 10px; border-radius: 4px; word-break: break-all;">
                        <a href="{invitation_url}">{invitation_url}</a>
                    </p>

                    <hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">
                    <p style="color: #999; font-size: 12px;">Thanks, The Kudos Team</p>
                </div>
            </body>
            </html>
        "#
    )
}

/// Generate plain-text body for a company invitation email.
pub fn company_invitation_text(
    inviter_name: &str,
    company_name: &str,
    invitation_url: &str,
) -> String {
    format!(
        "Hi there!\n\n\
        {} has invited you to join {} on Kudos.\n\n\
        Open Kudos to accept or decline the invitation:\n\
        {}\n\n\
        Thanks,\n\
        The Kudos Team",
        inviter_name, company_name, invitation_url
    )
}

/// Generate styled HTML body for a company invitation email.
pub fn company_invitation_html(
    inviter_name: &str,
    company_name: &str,
    invitation_url: &str,
) -> String {
    format!(
        r#"
            <html>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #00a884;">Join {company_name} on Kudos!</h2>

                    <p>Hi there!</p>

                    <p><strong>{inviter_name}</strong> has invited you to join <strong>{company_name}</strong>.</p>

                    <div style="text-align: center; margin: 30px 0;">
                        <a href="{invitation_url}"
                           style="background-color: #00a884; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px; display: inline-block; font-weight: bold;">
                            View Invitation
                        </a>
                    </div>

                    <p>Or copy and paste this link in your browser:</p>
                    <p style="background-color: #f5f5f5; padding: 10px; border-radius: 4px; word-break: break-all;">
                        <a href="{invitation_url}">{invitation_url}</a>
                    </p>

                    <hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">
                    <p style="color: #999; font-size: 12px;">Thanks, The Kudos Team</p>
                </div>
            </body>
            </html>
        "#
    )
}
