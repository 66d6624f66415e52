//! Environment file (`.env`) read by compose for both interpolation and the
//! container environment.

use crate::identity::HostIdentity;

pub fn render(identity: &HostIdentity, extra_env: Option<&str>) -> String {
    let mut text = format!(
        "DISPLAY=:0\n\
         QT_X11_NO_MITSHM=1\n\
         UID={}\n\
         GID={}\n\
         USER={}\n\
         GROUP={}\n",
        identity.uid, identity.gid, identity.user, identity.group
    );
    if let Some(extra) = extra_env {
        text.push('\n');
        text.push_str(extra);
    }
    text
}
